use portal_core::id::{ServiceId, Uid};
use portal_core::result::IntentSourceError;
use portal_core::{CatalogRepository, DirectoryRepository, IntentPatternSource};
use repositories::seed::LoadError;
use repositories::{FilePatternSource, SeedData, SeedStore};
use rstest::{fixture, rstest};
use std::path::PathBuf;

fn data_file(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("data")
        .join(name)
}

fn scratch_file(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("portal-{}-{name}", std::process::id()))
}

#[fixture]
fn store() -> SeedStore {
    SeedStore::load(&data_file("seed-data.json")).unwrap()
}

#[rstest]
#[tokio::test]
async fn seed_file_loads_users_and_services(store: SeedStore) {
    assert_eq!(5, store.catalog().count().await.unwrap());
    assert_eq!(3, store.directory().count().await.unwrap());
}

#[rstest]
#[tokio::test]
async fn get_service_by_id(store: SeedStore) {
    let service = store
        .catalog()
        .get(ServiceId::from("welfare_relief_2025"))
        .await
        .unwrap()
        .expect("seeded service exists");

    assert_eq!(
        Some("Welfare Relief Assistance 2025"),
        service.details.get("name").and_then(|v| v.as_str())
    );
}

#[rstest]
#[tokio::test]
async fn get_unknown_service_returns_none(store: SeedStore) {
    let service = store
        .catalog()
        .get(ServiceId::from("not_a_service"))
        .await
        .unwrap();

    assert!(service.is_none());
}

#[rstest]
#[tokio::test]
async fn list_without_category_returns_all_in_load_order(store: SeedStore) {
    let services = store.catalog().list(None).await.unwrap();

    let ids: Vec<_> = services.iter().map(|s| s.service_id.as_str()).collect();
    assert_eq!(
        vec![
            "welfare_relief_2025",
            "business_permit_local",
            "scholarship_merit_2025",
            "health_screening_senior",
            "housing_rent_assist",
        ],
        ids
    );
}

#[rstest]
#[case::welfare("welfare", vec!["welfare_relief_2025", "housing_rent_assist"])]
#[case::financial("financial", vec!["welfare_relief_2025", "scholarship_merit_2025"])]
#[case::health("health", vec!["health_screening_senior"])]
#[case::unknown("transport", vec![])]
#[case::case_sensitive("Welfare", vec![])]
#[tokio::test]
async fn list_by_category_filters_exactly(
    store: SeedStore,
    #[case] category: &str,
    #[case] expected: Vec<&str>,
) {
    let services = store
        .catalog()
        .list(Some(category.to_string()))
        .await
        .unwrap();

    let ids: Vec<_> = services.iter().map(|s| s.service_id.as_str()).collect();
    assert_eq!(expected, ids);
}

#[rstest]
#[tokio::test]
async fn first_ids_takes_catalog_prefix(store: SeedStore) {
    let ids = store.catalog().first_ids(3).await.unwrap();

    assert_eq!(
        vec![
            ServiceId::from("welfare_relief_2025"),
            ServiceId::from("business_permit_local"),
            ServiceId::from("scholarship_merit_2025"),
        ],
        ids
    );
}

#[rstest]
#[tokio::test]
async fn get_user_by_uid(store: SeedStore) {
    let user = store
        .directory()
        .get(Uid::from("user_david"))
        .await
        .unwrap()
        .expect("seeded user exists");

    assert_eq!(
        Some("David Tan"),
        user.profile.get("name").and_then(|v| v.as_str())
    );
}

#[rstest]
#[tokio::test]
async fn get_unknown_user_returns_none(store: SeedStore) {
    let user = store.directory().get(Uid::from("nobody")).await.unwrap();

    assert!(user.is_none());
}

#[tokio::test]
async fn empty_store_has_nothing() {
    let store = SeedStore::new(SeedData::default());

    assert_eq!(0, store.catalog().count().await.unwrap());
    assert!(store.catalog().first_ids(3).await.unwrap().is_empty());
    assert_eq!(0, store.directory().count().await.unwrap());
}

#[test]
fn missing_seed_file_is_io_error() {
    let err = SeedStore::load(&scratch_file("missing-seed.json")).unwrap_err();

    assert!(matches!(err.current_context(), LoadError::Io));
}

#[test]
fn malformed_seed_file_is_json_error() {
    let path = scratch_file("malformed-seed.json");
    std::fs::write(&path, "{ \"users\": [").unwrap();

    let err = SeedStore::load(&path).unwrap_err();
    std::fs::remove_file(&path).unwrap();

    assert!(matches!(err.current_context(), LoadError::Json));
}

#[test]
fn seed_file_may_omit_collections() {
    let path = scratch_file("partial-seed.json");
    std::fs::write(&path, r#"{ "users": [{ "uid": "only_user" }] }"#).unwrap();

    let store = SeedStore::load(&path);
    std::fs::remove_file(&path).unwrap();

    assert!(store.is_ok());
}

#[tokio::test]
async fn intent_file_loads_patterns_in_order() {
    let source = FilePatternSource::new(data_file("intent-mapping.json"));

    let patterns = source.load().await.unwrap();

    assert!(!patterns.is_empty());
    assert_eq!("welfare_relief_2025", patterns[0].service_id.as_str());
    assert_eq!(Some("en"), patterns[0].lang.as_deref());
}

#[tokio::test]
async fn intent_file_is_reread_on_every_load() {
    let path = scratch_file("reread-intents.json");
    tokio::fs::write(
        &path,
        r#"{ "patterns": [{ "match": "welfare", "serviceId": "welfare_relief_2025" }] }"#,
    )
    .await
    .unwrap();
    let source = FilePatternSource::new(&path);

    let before = source.load().await.unwrap();

    tokio::fs::write(
        &path,
        r#"{ "patterns": [
            { "match": "welfare", "serviceId": "welfare_relief_2025" },
            { "match": "permit", "serviceId": "business_permit_local" }
        ] }"#,
    )
    .await
    .unwrap();

    let after = source.load().await.unwrap();
    tokio::fs::remove_file(&path).await.unwrap();

    assert_eq!(1, before.len());
    assert_eq!(2, after.len());
    assert_eq!(None, after[1].lang);
}

#[tokio::test]
async fn missing_intent_file_is_read_error() {
    let source = FilePatternSource::new(scratch_file("missing-intents.json"));

    let err = source.load().await.unwrap_err();

    assert!(matches!(err.current_context(), IntentSourceError::Read));
}

#[tokio::test]
async fn malformed_intent_file_is_parse_error() {
    let path = scratch_file("malformed-intents.json");
    tokio::fs::write(&path, r#"{ "rules": [] }"#).await.unwrap();
    let source = FilePatternSource::new(&path);

    let err = source.load().await.unwrap_err();
    tokio::fs::remove_file(&path).await.unwrap();

    assert!(matches!(err.current_context(), IntentSourceError::Parse));
}
