use ga_pii_report::{config::Config, pii::PiiClassifier};

fn default_classifier() -> PiiClassifier {
    PiiClassifier::from_config(&Config::default()).unwrap()
}

#[test]
fn flags_obvious_pii() {
    let c = default_classifier();
    for v in [
        "contact me at a@b.com",
        "/signup?email=jane.doe@example.org",
        "password=secret1",
        "/login?pwd=hunter2",
        "/profile?phone=+4412345",
        "/profile?mobile=07700",
        "/checkout?address=10DowningSt",
        "/checkout?postcode=90210",
        "/checkout?zip=12345",
    ] {
        assert!(c.is_pii(v), "expected PII: {v}");
    }
}

#[test]
fn leaves_ordinary_paths_alone() {
    let c = default_classifier();
    for v in [
        "/normal/page/path",
        "www.example.com",
        "/blog/@handle",
        "/search?q=passport",
        "/password-reset",
        "/contact?tel=abc",
    ] {
        assert!(!c.is_pii(v), "expected clean: {v}");
    }
}

#[test]
fn case_sensitivity_is_configurable() {
    let mut cfg = Config::default();
    assert!(!PiiClassifier::from_config(&cfg).unwrap().is_pii("/x?PASSWORD=abc"));
    cfg.pii.case_insensitive = true;
    assert!(PiiClassifier::from_config(&cfg).unwrap().is_pii("/x?PASSWORD=abc"));
}

#[test]
fn extra_patterns_extend_the_default() {
    let mut cfg = Config::default();
    cfg.pii.extra_patterns = vec![r"ssn=\d{3}-\d{2}-\d{4}".into()];
    let c = PiiClassifier::from_config(&cfg).unwrap();
    assert!(c.is_pii("/form?ssn=123-45-6789"));
    assert!(c.is_pii("a@b.com"));
    assert_eq!(c.first_match("/form?ssn=123-45-6789"), Some("ssn=123-45-6789"));
}

#[test]
fn invalid_pattern_is_reported() {
    let mut cfg = Config::default();
    cfg.pii.extra_patterns = vec!["(unclosed".into()];
    let err = PiiClassifier::from_config(&cfg).err().expect("bad pattern");
    assert!(err.to_string().contains("(unclosed"));
}
