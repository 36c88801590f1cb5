use crate::config::Config;
use anyhow::{Context, Result};
use regex::{Regex, RegexBuilder};

/// Heuristic PII markers in URLs and hostnames: an `@` glued to a preceding
/// character, or a `pass=`, `phone=`, `address=` or `postcode=` style query
/// assignment.
pub const DEFAULT_PII_PATTERN: &str = r"[^\s@./-]@|(pass(word|wd)?|pwd)=\w+|(tel(ephone)?|phone|mob(ile)?)=\+?\d{2}|address=\w+|(post(code|alcode)?|zip(code)?)=\d+";

pub struct PiiClassifier {
    regs: Vec<Regex>,
}

impl PiiClassifier {
    pub fn new(patterns: &[String], case_insensitive: bool) -> Result<Self> {
        let regs = patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(case_insensitive)
                    .build()
                    .with_context(|| format!("compiling PII pattern: {p}"))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Self { regs })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        let mut patterns = vec![cfg.pii.pattern.clone()];
        patterns.extend(cfg.pii.extra_patterns.iter().cloned());
        Self::new(&patterns, cfg.pii.case_insensitive)
    }

    pub fn is_pii(&self, value: &str) -> bool {
        self.regs.iter().any(|r| r.is_match(value))
    }

    /// The first matching fragment, for diagnostics.
    pub fn first_match<'v>(&self, value: &'v str) -> Option<&'v str> {
        self.regs
            .iter()
            .find_map(|r| r.find(value))
            .map(|m| m.as_str())
    }
}
