//! Integration tests for the SQLite hub store on disk

use std::sync::Arc;

use application::{
    Backend, ConfigStore, DeparturesPort, HubConfig, LineChanges, SetupService, StopTimesQuery,
};
use async_trait::async_trait;
use domain::{Departure, GeoLocation, Line, Stop, TransportMode};
use infrastructure::persistence::migrations::{SCHEMA_VERSION, schema_version};
use infrastructure::{DatabaseConfig, create_pool, open_config_store};

/// Backend that is never reached by these tests
struct OfflinePort;

#[async_trait]
impl DeparturesPort for OfflinePort {
    async fn stop_times(
        &self,
        _query: &StopTimesQuery,
    ) -> Result<Vec<Departure>, application::ApplicationError> {
        Ok(vec![])
    }

    async fn search_stops(&self, _query: &str) -> Result<Vec<Stop>, application::ApplicationError> {
        Ok(vec![])
    }

    async fn lines_at_stop(&self, _stop_id: &str) -> Result<Vec<Line>, application::ApplicationError> {
        Ok(vec![])
    }

    async fn stops_near(
        &self,
        _location: &GeoLocation,
        _radius_m: u32,
    ) -> Result<Vec<Stop>, application::ApplicationError> {
        Ok(vec![])
    }
}

fn db_config(dir: &tempfile::TempDir) -> DatabaseConfig {
    DatabaseConfig {
        path: dir.path().join("departures.db").display().to_string(),
        max_connections: 2,
        run_migrations: true,
    }
}

fn line(route: &str, direction: &str, head_sign: &str) -> Line {
    Line::new(route, direction, head_sign, "67", TransportMode::Bus)
}

fn hub() -> HubConfig {
    HubConfig::new(
        Backend::Efa,
        "https://efa.example.org/efa",
        vec!["de:09564:704".into(), "de:09564:704:1".into()],
        "Plärrer",
        "Plärrer",
    )
    .with_location(GeoLocation::new(49.4478, 11.0629).unwrap())
    .with_lines(vec![
        line("van:02067: :R:j25", "de:09564:510", "Hauptbahnhof"),
        line("van:02067: :H:j25", "de:09564:100", "Nordostbahnhof"),
    ])
}

fn service(store: Arc<dyn ConfigStore>) -> SetupService {
    SetupService::new(Arc::new(OfflinePort), store)
}

#[tokio::test]
async fn hub_config_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    {
        let store = open_config_store(&db_config(&dir)).unwrap();
        service(store).create_hub(hub()).await.unwrap();
    }

    let store = open_config_store(&db_config(&dir)).unwrap();
    let loaded = service(store).load_hub("Plärrer").await.unwrap();
    assert_eq!(loaded, hub());
    assert_eq!(loaded.backend, Backend::Efa);
    assert_eq!(loaded.lines[0].mode, TransportMode::Bus);
    assert!(loaded.stop_location.is_some());
}

#[tokio::test]
async fn stored_document_is_flat_json() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_config_store(&db_config(&dir)).unwrap();
    service(Arc::clone(&store)).create_hub(hub()).await.unwrap();

    let doc = store.get("hub:Plärrer").await.unwrap().unwrap();
    assert_eq!(doc["backend"], "efa");
    assert_eq!(doc["stop_ids"][1], "de:09564:704:1");
    assert_eq!(doc["lines"][0]["route_id"], "van:02067: :R:j25");
    assert_eq!(doc["lines"][0]["direction_id"], "de:09564:510");
    assert_eq!(doc["lines"][0]["transport_mode"], "BUS");
}

#[tokio::test]
async fn line_update_is_persisted() {
    let dir = tempfile::tempdir().unwrap();
    let store = open_config_store(&db_config(&dir)).unwrap();
    let service = service(store);
    service.create_hub(hub()).await.unwrap();

    let extra = line("van:02036: :R:j25", "de:09564:300", "Röthenbach");
    let selected = vec![hub().lines[0].unique_id(), extra.unique_id()];
    let (_, changes) = service
        .update_lines("Plärrer", &selected, std::slice::from_ref(&extra))
        .await
        .unwrap();

    assert_eq!(
        changes,
        LineChanges {
            added: vec![extra.clone()],
            removed: vec![hub().lines[1].clone()],
        }
    );
    let reloaded = service.load_hub("Plärrer").await.unwrap();
    assert_eq!(reloaded.lines, vec![hub().lines[0].clone(), extra]);
}

#[tokio::test]
async fn removed_hub_is_gone_after_reopen() {
    let dir = tempfile::tempdir().unwrap();
    {
        let service = service(open_config_store(&db_config(&dir)).unwrap());
        service.create_hub(hub()).await.unwrap();
        service.remove_hub("Plärrer").await.unwrap();
    }

    let service = service(open_config_store(&db_config(&dir)).unwrap());
    assert!(service.list_hubs().await.unwrap().is_empty());
}

#[test]
fn schema_is_current_after_open() {
    let dir = tempfile::tempdir().unwrap();
    let pool = create_pool(&db_config(&dir)).unwrap();
    let conn = pool.get().unwrap();
    assert_eq!(schema_version(&conn).unwrap(), SCHEMA_VERSION);
}
