use jsonschema::JSONSchema;
use oss_catalog::schema::{RecordSchema, BUNDLED_SCHEMA};
use serde_json::json;

#[test]
fn example_record_is_valid() {
    let schema = include_str!("../schemas/project.v1.json");
    let instance = include_str!("resources/project_record.json");
    let schema_json: serde_json::Value = serde_json::from_str(schema).unwrap();
    let instance_json: serde_json::Value = serde_json::from_str(instance).unwrap();
    let schema_static: &'static serde_json::Value = Box::leak(Box::new(schema_json));
    let compiled = JSONSchema::options().compile(schema_static).unwrap();
    assert!(compiled.is_valid(&instance_json));
}

#[test]
fn bundled_schema_matches_the_file_on_disk() {
    assert_eq!(BUNDLED_SCHEMA, include_str!("../schemas/project.v1.json"));
}

#[test]
fn unknown_owner_type_is_rejected() {
    let schema = RecordSchema::bundled().unwrap();
    let mut invalid: serde_json::Value =
        serde_json::from_str(include_str!("resources/project_record.json")).unwrap();
    invalid["owner"]["type"] = json!("government");

    let violations = schema.violations(&invalid);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "owner.type");
}

#[test]
fn unexpected_keys_are_rejected() {
    let schema = RecordSchema::bundled().unwrap();
    let mut with_extra: serde_json::Value =
        serde_json::from_str(include_str!("resources/project_record.json")).unwrap();
    with_extra["stars"] = json!(1200);

    let violations = schema.violations(&with_extra);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "stars");
}

#[test]
fn category_values_are_left_to_configuration() {
    // The schema only pins the type; allowed categories come from config
    let schema = RecordSchema::bundled().unwrap();
    let mut record: serde_json::Value =
        serde_json::from_str(include_str!("resources/project_record.json")).unwrap();
    record["category"] = json!("blockchain");
    assert!(schema.is_valid(&record));
}

#[test]
fn runtime_schema_can_replace_the_bundled_one() {
    let strict = json!({
        "type": "object",
        "required": ["name", "homepage"]
    });
    let schema = RecordSchema::from_value(strict).unwrap();
    let record: serde_json::Value =
        serde_json::from_str(include_str!("resources/project_record.json")).unwrap();

    let violations = schema.violations(&record);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "homepage");
}

#[test]
fn owner_details_are_allowed_with_their_types() {
    let schema = RecordSchema::bundled().unwrap();
    let mut record: serde_json::Value =
        serde_json::from_str(include_str!("resources/project_record.json")).unwrap();
    record["owner"]["description"] = json!("Maps for the ferrous age");
    record["owner"]["is_a_startup"] = json!(true);
    assert!(schema.is_valid(&record));

    record["owner"]["is_a_startup"] = json!("Yes");
    let violations = schema.violations(&record);
    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].field, "owner.is_a_startup");
}
