use super::*;

fn tag(image: &str, name: &str, size: u64) -> JobResult {
    JobResult::Tag {
        image: image.to_string(),
        tag: TagRecord::new(name, "sha256:0123456789abcdef", size),
    }
}

#[test]
fn test_tag_record_strips_sha256_prefix() {
    let tag = TagRecord::new("v1", "sha256:deadbeef", 1);
    assert_eq!(tag.digest, "deadbeef");
}

#[test]
fn test_tag_record_keeps_other_algorithms() {
    let tag = TagRecord::new("v1", "sha512:deadbeef", 1);
    assert_eq!(tag.digest, "sha512:deadbeef");
}

#[test]
fn test_collect_groups_by_image_in_arrival_order() {
    let report = collect_records(vec![
        tag("beta", "v1", 300),
        tag("alpha", "v1", 100),
        tag("beta", "latest", 200),
    ]);

    assert_eq!(report.images.len(), 2);
    assert_eq!(report.images[0].name, "beta");
    assert_eq!(report.images[0].tags.len(), 2);
    assert_eq!(report.images[1].name, "alpha");
    assert_eq!(report.tag_count(), 3);
    assert!(report.failures.is_empty());
}

#[test]
fn test_collect_separates_failures_and_cancellations() {
    let report = collect_records(vec![
        tag("alpha", "v1", 100),
        JobResult::Failed {
            image: Some("broken".to_string()),
            tag: None,
            error: ScoutError::server("boom", 500),
        },
        JobResult::Cancelled {
            image: Some("alpha".to_string()),
            tag: Some("v2".to_string()),
        },
    ]);

    assert_eq!(report.tag_count(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].image.as_deref(), Some("broken"));
    assert_eq!(report.cancelled, 1);
}

#[test]
fn test_collect_empty() {
    let report = collect_records(Vec::new());
    assert!(report.is_empty());
    assert_eq!(report.cancelled, 0);
}

#[test]
fn test_sort_records_orders_images_and_tags() {
    let mut report = collect_records(vec![
        tag("beta", "v1", 300),
        tag("alpha", "v2", 100),
        tag("alpha", "v1", 100),
        tag("beta", "latest", 200),
    ]);

    sort_records(&mut report.images);

    let names: Vec<_> = report.images.iter().map(|i| i.name.as_str()).collect();
    assert_eq!(names, vec!["alpha", "beta"]);
    let alpha_tags: Vec<_> = report.images[0].tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(alpha_tags, vec!["v1", "v2"]);
    let beta_tags: Vec<_> = report.images[1].tags.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(beta_tags, vec!["latest", "v1"]);
}

#[test]
fn test_records_serialize_with_plain_field_names() {
    let record = ImageRecord {
        name: "alpha".to_string(),
        tags: vec![TagRecord::new("v1", "sha256:abc", 100)],
    };
    let json = serde_json::to_value(&record).unwrap();
    assert_eq!(json["name"], "alpha");
    assert_eq!(json["tags"][0]["name"], "v1");
    assert_eq!(json["tags"][0]["digest"], "abc");
    assert_eq!(json["tags"][0]["size"], 100);
}
