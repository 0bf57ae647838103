use directory_core::db::open_db_in_memory;
use directory_core::{
    demo_seed_data, seed_directory, DirectoryStore, SeedActivity, SeedBuilding, SeedData,
    SeedError, SeedOrganization, SeedReport, SeedValidationError, SqliteDirectoryStore,
};
use rusqlite::Connection;

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}

fn activity(key: &str, name: &str, parent_key: Option<&str>) -> SeedActivity {
    SeedActivity {
        key: key.to_string(),
        name: name.to_string(),
        parent_key: parent_key.map(str::to_string),
    }
}

fn building(key: &str, latitude: f64, longitude: f64) -> SeedBuilding {
    SeedBuilding {
        key: key.to_string(),
        address: format!("{key} address"),
        latitude,
        longitude,
    }
}

fn organization(name: &str, building_key: &str, activity_keys: &[&str]) -> SeedOrganization {
    SeedOrganization {
        name: name.to_string(),
        building_key: building_key.to_string(),
        phone_numbers: vec!["1-000".to_string()],
        activity_keys: activity_keys.iter().map(|key| key.to_string()).collect(),
    }
}

fn small_data() -> SeedData {
    SeedData {
        activities: vec![
            activity("a", "Alpha", None),
            activity("b", "Beta", Some("a")),
            activity("c", "Gamma", Some("a")),
            activity("d", "Delta", Some("b")),
        ],
        buildings: vec![building("hq", 10.0, 20.0)],
        organizations: vec![organization("Acme", "hq", &["a"])],
    }
}

#[test]
fn demo_seed_reports_row_counts() {
    let mut conn = open_db_in_memory().unwrap();
    let report = seed_directory(&mut conn, &demo_seed_data()).unwrap();

    assert_eq!(
        report,
        SeedReport {
            activities: 12,
            buildings: 2,
            organizations: 4,
            phones: 9,
        }
    );
    assert_eq!(count(&conn, "activities"), 12);
    assert_eq!(count(&conn, "organization_phone_numbers"), 9);
    assert_eq!(count(&conn, "organization_activities"), 3);
}

#[test]
fn demo_seed_links_parents_by_key() {
    let mut conn = open_db_in_memory().unwrap();
    seed_directory(&mut conn, &demo_seed_data()).unwrap();
    let store = SqliteDirectoryStore::try_new(&conn).unwrap();

    let cheese = store.activity_by_name("Cheese").unwrap().unwrap();
    let dairy = store.activity_by_name("Dairy Products").unwrap().unwrap();
    let food = store.activity_by_name("Food").unwrap().unwrap();
    assert_eq!(cheese.parent_id, Some(dairy.id));
    assert_eq!(dairy.parent_id, Some(food.id));
    assert_eq!(food.parent_id, None);
}

#[test]
fn reseeding_replaces_previous_contents() {
    let mut conn = open_db_in_memory().unwrap();
    seed_directory(&mut conn, &demo_seed_data()).unwrap();
    seed_directory(&mut conn, &small_data()).unwrap();

    assert_eq!(count(&conn, "activities"), 4);
    assert_eq!(count(&conn, "buildings"), 1);
    assert_eq!(count(&conn, "organizations"), 1);
    assert_eq!(count(&conn, "organization_phone_numbers"), 1);
    assert_eq!(count(&conn, "organization_activities"), 1);

    let store = SqliteDirectoryStore::try_new(&conn).unwrap();
    assert!(store.activity_by_name("Food").unwrap().is_none());
}

#[test]
fn duplicate_activity_keys_in_organization_are_linked_once() {
    let mut conn = open_db_in_memory().unwrap();
    let mut data = small_data();
    data.organizations = vec![organization("Acme", "hq", &["b", "b", "c"])];

    seed_directory(&mut conn, &data).unwrap();
    assert_eq!(count(&conn, "organization_activities"), 2);
}

#[test]
fn empty_seed_clears_directory() {
    let mut conn = open_db_in_memory().unwrap();
    seed_directory(&mut conn, &demo_seed_data()).unwrap();

    let report = seed_directory(&mut conn, &SeedData::default()).unwrap();
    assert_eq!(report, SeedReport::default());
    assert_eq!(count(&conn, "organizations"), 0);
    assert_eq!(count(&conn, "activities"), 0);
}

#[test]
fn invalid_seed_leaves_previous_contents_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    seed_directory(&mut conn, &demo_seed_data()).unwrap();

    let mut data = small_data();
    data.organizations[0].building_key = "nowhere".to_string();
    let err = seed_directory(&mut conn, &data).unwrap_err();

    assert!(matches!(
        err,
        SeedError::Validation(SeedValidationError::UnknownBuilding { .. })
    ));
    assert_eq!(count(&conn, "organizations"), 4);
}

#[test]
fn validate_rejects_parent_declared_after_child() {
    let mut data = small_data();
    data.activities = vec![activity("b", "Beta", Some("a")), activity("a", "Alpha", None)];

    assert_eq!(
        data.validate(),
        Err(SeedValidationError::UnknownParentActivity {
            key: "b".to_string(),
            parent_key: "a".to_string(),
        })
    );
}

#[test]
fn validate_rejects_self_parent() {
    let mut data = small_data();
    data.activities.push(activity("loop", "Loop", Some("loop")));

    assert!(matches!(
        data.validate(),
        Err(SeedValidationError::UnknownParentActivity { .. })
    ));
}

#[test]
fn validate_rejects_duplicate_activity_key_and_name() {
    let mut data = small_data();
    data.activities.push(activity("a", "Other", None));
    assert_eq!(
        data.validate(),
        Err(SeedValidationError::DuplicateActivityKey("a".to_string()))
    );

    let mut data = small_data();
    data.activities.push(activity("z", "Alpha", None));
    assert_eq!(
        data.validate(),
        Err(SeedValidationError::DuplicateActivityName("Alpha".to_string()))
    );
}

#[test]
fn validate_rejects_blank_names() {
    let mut data = small_data();
    data.activities.push(activity("blank", "   ", None));
    assert_eq!(
        data.validate(),
        Err(SeedValidationError::BlankActivityName {
            key: "blank".to_string()
        })
    );

    let mut data = small_data();
    data.organizations.push(organization(" ", "hq", &[]));
    assert_eq!(
        data.validate(),
        Err(SeedValidationError::BlankOrganizationName)
    );
}

#[test]
fn validate_rejects_buildings_with_bad_keys_or_coordinates() {
    let mut data = small_data();
    data.buildings.push(building("hq", 0.0, 0.0));
    assert_eq!(
        data.validate(),
        Err(SeedValidationError::DuplicateBuildingKey("hq".to_string()))
    );

    let mut data = small_data();
    data.buildings.push(building("pole", 91.0, 0.0));
    assert_eq!(
        data.validate(),
        Err(SeedValidationError::CoordinatesOutOfRange {
            key: "pole".to_string()
        })
    );

    let mut data = small_data();
    data.buildings.push(building("dateline", 0.0, -180.5));
    assert!(matches!(
        data.validate(),
        Err(SeedValidationError::CoordinatesOutOfRange { .. })
    ));
}

#[test]
fn validate_rejects_unknown_activity_reference() {
    let mut data = small_data();
    data.organizations = vec![organization("Acme", "hq", &["missing"])];

    assert_eq!(
        data.validate(),
        Err(SeedValidationError::UnknownActivity {
            organization: "Acme".to_string(),
            activity_key: "missing".to_string(),
        })
    );
}

#[test]
fn validate_caps_distinct_activities_per_organization() {
    let mut data = small_data();
    data.organizations = vec![organization("Acme", "hq", &["a", "b", "c", "d"])];
    assert_eq!(
        data.validate(),
        Err(SeedValidationError::TooManyActivities {
            organization: "Acme".to_string(),
            count: 4,
        })
    );

    data.organizations = vec![organization("Acme", "hq", &["a", "b", "c", "c"])];
    assert_eq!(data.validate(), Ok(()));
}

#[test]
fn json_seed_file_loads_with_defaults() {
    let data: SeedData = serde_json::from_str(
        r#"{
            "activities": [
                {"key": "food", "name": "Food"},
                {"key": "dairy", "name": "Dairy Products", "parent_key": "food"}
            ],
            "buildings": [
                {"key": "hq", "address": "Kazan, Baumana st. 15", "latitude": 55.79, "longitude": 49.12}
            ],
            "organizations": [
                {"name": "Milk Bar", "building_key": "hq", "activity_keys": ["dairy"]},
                {"name": "Empty Office", "building_key": "hq", "phone_numbers": ["1-000"]}
            ]
        }"#,
    )
    .unwrap();

    assert_eq!(data.activities[0].parent_key, None);
    assert!(data.organizations[0].phone_numbers.is_empty());
    assert!(data.organizations[1].activity_keys.is_empty());

    let mut conn = open_db_in_memory().unwrap();
    let report = seed_directory(&mut conn, &data).unwrap();
    assert_eq!(
        report,
        SeedReport {
            activities: 2,
            buildings: 1,
            organizations: 2,
            phones: 1,
        }
    );
}

#[test]
fn json_seed_file_rejects_unknown_fields() {
    let err = serde_json::from_str::<SeedData>(r#"{"orgs": []}"#).unwrap_err();
    assert!(err.to_string().contains("orgs"));

    let empty: SeedData = serde_json::from_str("{}").unwrap();
    assert_eq!(empty, SeedData::default());
}
