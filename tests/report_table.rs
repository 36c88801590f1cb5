use ga_pii_report::{
    config::Config,
    table::{report_filename, sanitize_value, ReportTable, ReportWriter},
};

#[test]
fn sorts_descending_and_keeps_tie_order() {
    let mut t = ReportTable::build(
        "Hostname",
        "Pageviews",
        vec!["five".into(), "twenty-a".into(), "one".into(), "twenty-b".into()],
        vec![5, 20, 1, 20],
    )
    .unwrap();
    t.sort_by_metric_desc();

    let order: Vec<_> = t.rows.iter().map(|r| r.value.as_str()).collect();
    assert_eq!(order, vec!["twenty-a", "twenty-b", "five", "one"]);
    assert!(t.rows.windows(2).all(|w| w[0].metric >= w[1].metric));
}

#[test]
fn strips_semicolons() {
    assert_eq!(sanitize_value("foo;bar"), "foobar");
    assert_eq!(sanitize_value(";;a;"), "a");
}

#[test]
fn filename_is_deterministic() {
    assert_eq!(
        report_filename("Main Site", "Hostname"),
        "PII - Main Site - Hostname.csv"
    );
}

#[test]
fn writes_only_flagged_rows() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ReportWriter::new(&Config::default(), dir.path()).unwrap();

    let written = writer
        .classify_and_write(
            "Page path",
            vec![
                "/home".into(),
                "/signup?email=a@b.com".into(),
                "/login?password=x;y".into(),
            ],
            "Main Site",
            vec![100, 3, 9],
        )
        .unwrap();

    assert_eq!(written.total_rows, 3);
    assert_eq!(written.pii_rows, 2);
    assert_eq!(
        written.path.file_name().unwrap(),
        "PII - Main Site - Page path.csv"
    );

    let body = std::fs::read_to_string(&written.path).unwrap();
    let lines: Vec<_> = body.lines().collect();
    assert_eq!(
        lines,
        vec![
            ",Page path,Pageviews,PII",
            "2,/login?password=xy,9,YES",
            "1,/signup?email=a@b.com,3,YES",
        ]
    );
}

#[test]
fn header_only_when_nothing_is_flagged() {
    let dir = tempfile::tempdir().unwrap();
    let writer = ReportWriter::new(&Config::default(), dir.path()).unwrap();
    let written = writer
        .classify_and_write("Hostname", vec!["example.com".into()], "Blog", vec![1])
        .unwrap();
    assert_eq!(written.pii_rows, 0);
    let body = std::fs::read_to_string(&written.path).unwrap();
    assert_eq!(body.trim_end(), ",Hostname,Pageviews,PII");
}
