use bloodwork_data::database::DatabasePool;
use bloodwork_data::models::{NewMeasurementRecord, NewTestEventRecord};
use bloodwork_data::repository::{BloodworkRepository, BloodworkRepositoryTrait, RepositoryError};
use uuid::Uuid;

fn sqlite_repository() -> BloodworkRepository {
    BloodworkRepository::with_database(DatabasePool::in_memory().expect("in-memory pool"))
}

fn memory_repository() -> BloodworkRepository {
    BloodworkRepository::in_memory().expect("in-memory repository")
}

fn backends() -> Vec<(&'static str, BloodworkRepository)> {
    vec![("sqlite", sqlite_repository()), ("memory", memory_repository())]
}

fn new_test(date: &str) -> NewTestEventRecord {
    NewTestEventRecord {
        test_date: date.to_string(),
        lab_name: Some("Labor Nord".to_string()),
        doctor_name: None,
        notes: None,
    }
}

async fn definition_id(repo: &BloodworkRepository, code: &str) -> i64 {
    repo.get_definition_by_code(code)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("{} missing from catalog", code))
        .id
}

fn measurement(definition_id: i64, value: f64, status: &str) -> NewMeasurementRecord {
    NewMeasurementRecord {
        definition_id,
        value,
        status: status.to_string(),
        notes: None,
    }
}

#[tokio::test]
async fn test_catalog_is_ordered_by_category_then_sort_order() {
    for (name, repo) in backends() {
        let definitions = repo.list_definitions().await.unwrap();
        assert!(definitions.len() >= 40, "{}: catalog too small", name);

        for pair in definitions.windows(2) {
            let (a, b) = (&pair[0], &pair[1]);
            let ordered = a.category < b.category
                || (a.category == b.category && a.sort_order <= b.sort_order);
            assert!(ordered, "{}: {} listed before {}", name, a.code, b.code);
        }

        let hb = repo.get_definition_by_code("Hb").await.unwrap().unwrap();
        let same = repo.get_definition(hb.id).await.unwrap().unwrap();
        assert_eq!(hb, same, "{}", name);
        assert!(repo.get_definition_by_code("hb").await.unwrap().is_none(), "{}: codes are case-sensitive", name);
    }
}

#[tokio::test]
async fn test_search_matches_names_codes_and_category() {
    for (name, repo) in backends() {
        let by_name = repo.search_definitions("kreatinin").await.unwrap();
        assert!(by_name.iter().any(|d| d.code == "CREA"), "{}", name);

        let by_english = repo.search_definitions("Hemoglobin").await.unwrap();
        assert!(by_english.iter().any(|d| d.code == "Hb"), "{}", name);

        let by_category = repo.search_definitions("Leberwerte").await.unwrap();
        assert!(by_category.len() >= 5, "{}", name);
        assert!(by_category.iter().all(|d| d.category == "Leberwerte"), "{}", name);

        assert!(repo.search_definitions("no such analyte").await.unwrap().is_empty(), "{}", name);
    }
}

#[tokio::test]
async fn test_create_and_load_test_with_measurements() {
    for (name, repo) in backends() {
        let glu = definition_id(&repo, "GLU").await;
        let hb = definition_id(&repo, "Hb").await;

        let (test, stored) = repo
            .create_test(new_test("2024-03-01"), vec![measurement(glu, 130.0, "HIGH"), measurement(hb, 14.2, "NORMAL")])
            .await
            .unwrap();
        assert_eq!(stored.len(), 2, "{}", name);

        let test_id = Uuid::parse_str(&test.id).unwrap();
        let loaded = repo.get_test(test_id).await.unwrap().unwrap();
        assert_eq!(loaded, test, "{}", name);

        let joined = repo.measurements_for_test(test_id).await.unwrap();
        let codes: Vec<&str> = joined.iter().map(|j| j.definition.code.as_str()).collect();
        // "Diabetes" sorts before "Kleines Blutbild"
        assert_eq!(codes, vec!["GLU", "Hb"], "{}", name);
        assert_eq!(joined[0].measurement.status, "HIGH", "{}", name);
    }
}

#[tokio::test]
async fn test_create_is_atomic_when_a_definition_is_unknown() {
    for (name, repo) in backends() {
        let glu = definition_id(&repo, "GLU").await;
        let result = repo
            .create_test(new_test("2024-03-01"), vec![measurement(glu, 90.0, "NORMAL"), measurement(99_999, 1.0, "NORMAL")])
            .await;
        assert!(result.is_err(), "{}", name);
        assert!(repo.list_tests(None, None).await.unwrap().is_empty(), "{}: partial test left behind", name);
    }
}

#[tokio::test]
async fn test_invalid_test_date_is_rejected() {
    for (name, repo) in backends() {
        let result = repo.create_test(new_test("01.03.2024"), vec![]).await;
        assert!(matches!(result, Err(RepositoryError::DateParse(_))), "{}", name);

        let result = repo.list_tests(Some("2024-13-01".to_string()), None).await;
        assert!(matches!(result, Err(RepositoryError::DateParse(_))), "{}", name);
    }
}

#[tokio::test]
async fn test_list_tests_newest_first_within_range() {
    for (name, repo) in backends() {
        for date in ["2023-11-20", "2024-02-01", "2024-05-15"] {
            repo.create_test(new_test(date), vec![]).await.unwrap();
        }

        let all = repo.list_tests(None, None).await.unwrap();
        let dates: Vec<&str> = all.iter().map(|t| t.test_date.as_str()).collect();
        assert_eq!(dates, vec!["2024-05-15", "2024-02-01", "2023-11-20"], "{}", name);

        let bounded = repo
            .list_tests(Some("2024-01-01".to_string()), Some("2024-05-15".to_string()))
            .await
            .unwrap();
        assert_eq!(bounded.len(), 2, "{}", name);
    }
}

#[tokio::test]
async fn test_upsert_replaces_value_for_same_definition() {
    for (name, repo) in backends() {
        let crea = definition_id(&repo, "CREA").await;
        let (test, stored) = repo
            .create_test(new_test("2024-03-01"), vec![measurement(crea, 1.0, "NORMAL")])
            .await
            .unwrap();
        let test_id = Uuid::parse_str(&test.id).unwrap();

        let replaced = repo.upsert_measurement(test_id, measurement(crea, 1.8, "HIGH")).await.unwrap();
        assert_eq!(replaced.id, stored[0].id, "{}: upsert must keep the row", name);
        assert_eq!(replaced.value, 1.8, "{}", name);
        assert_eq!(replaced.status, "HIGH", "{}", name);

        let joined = repo.measurements_for_test(test_id).await.unwrap();
        assert_eq!(joined.len(), 1, "{}", name);

        let missing = repo.upsert_measurement(Uuid::new_v4(), measurement(crea, 1.0, "NORMAL")).await;
        assert!(matches!(missing, Err(RepositoryError::NotFound(_))), "{}", name);
    }
}

#[tokio::test]
async fn test_update_and_delete_measurement() {
    for (name, repo) in backends() {
        let k = definition_id(&repo, "K").await;
        let (_, stored) = repo
            .create_test(new_test("2024-03-01"), vec![measurement(k, 4.0, "NORMAL")])
            .await
            .unwrap();
        let id = Uuid::parse_str(&stored[0].id).unwrap();

        let updated = repo
            .update_measurement(id, 6.8, "CRITICAL_HIGH".to_string(), Some("hemolysed".to_string()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.status, "CRITICAL_HIGH", "{}", name);
        assert_eq!(updated.notes.as_deref(), Some("hemolysed"), "{}", name);

        assert!(repo.delete_measurement(id).await.unwrap(), "{}", name);
        assert!(!repo.delete_measurement(id).await.unwrap(), "{}", name);
        assert!(repo.get_measurement(id).await.unwrap().is_none(), "{}", name);
        assert!(repo.update_measurement(id, 1.0, "NORMAL".to_string(), None).await.unwrap().is_none(), "{}", name);
    }
}

#[tokio::test]
async fn test_update_test_replaces_metadata() {
    for (name, repo) in backends() {
        let (test, _) = repo.create_test(new_test("2024-03-01"), vec![]).await.unwrap();
        let test_id = Uuid::parse_str(&test.id).unwrap();

        let update = NewTestEventRecord {
            test_date: "2024-03-02".to_string(),
            lab_name: None,
            doctor_name: Some("Dr. Weber".to_string()),
            notes: Some("nüchtern".to_string()),
        };
        let updated = repo.update_test(test_id, update).await.unwrap().unwrap();
        assert_eq!(updated.test_date, "2024-03-02", "{}", name);
        assert_eq!(updated.lab_name, None, "{}", name);
        assert_eq!(updated.created_at, test.created_at, "{}", name);

        assert!(repo.update_test(Uuid::new_v4(), new_test("2024-01-01")).await.unwrap().is_none(), "{}", name);
    }
}

#[tokio::test]
async fn test_delete_test_cascades_to_measurements() {
    for (name, repo) in backends() {
        let hb = definition_id(&repo, "Hb").await;
        let (test, stored) = repo
            .create_test(new_test("2024-03-01"), vec![measurement(hb, 11.0, "LOW")])
            .await
            .unwrap();
        let test_id = Uuid::parse_str(&test.id).unwrap();
        let measurement_id = Uuid::parse_str(&stored[0].id).unwrap();

        assert!(repo.delete_test(test_id).await.unwrap(), "{}", name);
        assert!(repo.get_test(test_id).await.unwrap().is_none(), "{}", name);
        assert!(repo.get_measurement(measurement_id).await.unwrap().is_none(), "{}: measurement survived", name);
        assert!(repo.history_for_definition(hb).await.unwrap().is_empty(), "{}", name);
        assert!(!repo.delete_test(test_id).await.unwrap(), "{}", name);
    }
}

#[tokio::test]
async fn test_history_is_oldest_first() {
    for (name, repo) in backends() {
        let tsh = definition_id(&repo, "TSH").await;
        for (date, value) in [("2024-06-01", 3.1), ("2023-01-15", 5.0), ("2024-01-10", 2.2)] {
            repo.create_test(new_test(date), vec![measurement(tsh, value, "NORMAL")]).await.unwrap();
        }

        let history = repo.history_for_definition(tsh).await.unwrap();
        let points: Vec<(&str, f64)> = history.iter().map(|p| (p.test_date.as_str(), p.value)).collect();
        assert_eq!(points, vec![("2023-01-15", 5.0), ("2024-01-10", 2.2), ("2024-06-01", 3.1)], "{}", name);
    }
}

#[tokio::test]
async fn test_status_counts_group_by_test_within_range() {
    for (name, repo) in backends() {
        let glu = definition_id(&repo, "GLU").await;
        let hb = definition_id(&repo, "Hb").await;
        let k = definition_id(&repo, "K").await;

        let (march, _) = repo
            .create_test(
                new_test("2024-03-01"),
                vec![measurement(glu, 130.0, "HIGH"), measurement(hb, 14.0, "NORMAL"), measurement(k, 4.0, "NORMAL")],
            )
            .await
            .unwrap();
        repo.create_test(new_test("2023-01-01"), vec![measurement(k, 7.0, "CRITICAL_HIGH")])
            .await
            .unwrap();

        let mut all = repo.status_counts(None, None).await.unwrap();
        all.sort_by(|a, b| (&a.test_id, &a.status).cmp(&(&b.test_id, &b.status)));
        assert_eq!(all.len(), 3, "{}", name);
        assert_eq!(all.iter().map(|r| r.count).sum::<i64>(), 4, "{}", name);

        let bounded = repo.status_counts(Some("2024-01-01".to_string()), None).await.unwrap();
        assert!(bounded.iter().all(|r| r.test_id == march.id), "{}", name);
        let normal = bounded.iter().find(|r| r.status == "NORMAL").unwrap();
        assert_eq!(normal.count, 2, "{}", name);

        let result = repo.status_counts(Some("01.01.2024".to_string()), None).await;
        assert!(matches!(result, Err(RepositoryError::DateParse(_))), "{}", name);
    }
}
