use std::sync::Arc;

use bizdesk_client::{
    ClientState, FileStore, Firm, FirmId, FirmPatch, FirmStatus, FirmStore, KeyValueStore,
    RoleScope, SelectedModuleStore,
};
use chrono::NaiveDate;
use serde_json::json;

fn firm(id: &str, name: &str, employees: u32) -> Firm {
    Firm {
        id: FirmId::new(id),
        name: name.to_string(),
        registration_number: format!("REG-{id}"),
        industry: "Logistics".to_string(),
        status: FirmStatus::Pending,
        employee_count: employees,
        location: "Karachi".to_string(),
        established_date: NaiveDate::from_ymd_opt(2019, 1, 15).unwrap(),
        contact_person: "Ari Chen".to_string(),
        email: format!("contact@{id}.test"),
        phone: "+92 21 555 0000".to_string(),
        revenue: 98_500.5,
        description: String::new(),
    }
}

fn file_store(dir: &tempfile::TempDir) -> Arc<dyn KeyValueStore> {
    Arc::new(FileStore::new(dir.path().join("storage.json")))
}

#[test]
fn firm_collection_survives_reload_in_order() {
    let dir = tempfile::tempdir().unwrap();

    let written = {
        let firms = FirmStore::new(file_store(&dir));
        firms.add_firm(firm("b", "Beta Freight", 40)).unwrap();
        firms.add_firm(firm("a", "Alpha Cargo", 12)).unwrap();
        firms.add_firm(firm("c", "Gamma Haulage", 7)).unwrap();
        firms
            .update_firm(
                &FirmId::new("a"),
                FirmPatch {
                    status: Some(FirmStatus::Active),
                    ..FirmPatch::default()
                },
            )
            .unwrap();
        firms.firms()
    };

    let reloaded = FirmStore::new(file_store(&dir));
    assert_eq!(reloaded.firms(), written);

    let ids: Vec<&str> = written.iter().map(|f| f.id.as_str()).collect();
    assert_eq!(ids, vec!["b", "a", "c"]);
    assert_eq!(
        reloaded.get(&FirmId::new("a")).unwrap().status,
        FirmStatus::Active
    );
}

#[test]
fn malformed_firm_storage_starts_empty_and_recovers() {
    let dir = tempfile::tempdir().unwrap();
    let storage = file_store(&dir);
    storage
        .set_item("firm-storage", r#"{"state":{"firms":[{"id":1}]},"version":0}"#)
        .unwrap();

    let firms = FirmStore::new(Arc::clone(&storage));
    assert!(firms.is_empty());

    // The next write replaces the bad payload.
    firms.add_firm(firm("1", "Acme", 3)).unwrap();
    let reloaded = FirmStore::new(storage);
    assert_eq!(reloaded.len(), 1);
}

#[test]
fn hydrates_firm_storage_written_by_the_web_client() {
    let dir = tempfile::tempdir().unwrap();
    let storage = file_store(&dir);
    let payload = json!({
        "state": {
            "firms": [{
                "id": "17",
                "name": "Northwind",
                "registrationNumber": "NW-17",
                "industry": "Retail",
                "status": "inactive",
                "employeeCount": 230,
                "location": "Lahore",
                "establishedDate": "2004-09-30",
                "contactPerson": "Dana Ito",
                "email": "hq@northwind.test",
                "phone": "+92 42 555 1717",
                "revenue": 5400000,
                "description": "Wholesale"
            }]
        },
        "version": 0
    });
    storage
        .set_item("firm-storage", &payload.to_string())
        .unwrap();

    let firms = FirmStore::new(storage);
    let northwind = firms.get(&FirmId::new("17")).unwrap();
    assert_eq!(northwind.status, FirmStatus::Inactive);
    assert_eq!(northwind.employee_count, 230);
    assert_eq!(northwind.revenue, 5_400_000.0);
}

#[test]
fn client_state_shares_one_bridge() {
    let dir = tempfile::tempdir().unwrap();

    {
        let state = ClientState::new(file_store(&dir));
        state.selected_module.select("Invoices");
        state.firms.add_firm(firm("1", "Acme", 5)).unwrap();
        state.roles.set_scope(
            RoleScope::Organization,
            Some(json!({ "permissions": [{ "module": "invoice", "actions": ["VIEW"] }] })),
        );
        assert!(state
            .roles
            .has_permission(RoleScope::Organization, "invoice", "VIEW"));

        state.sign_out();
        assert!(!state
            .roles
            .has_permission(RoleScope::Organization, "invoice", "VIEW"));
    }

    let reloaded = ClientState::new(file_store(&dir));
    assert_eq!(reloaded.selected_module.get(), "Invoices");
    assert_eq!(reloaded.firms.len(), 1);
    // Roles are never persisted.
    assert!(reloaded.roles.scope(RoleScope::Organization).is_none());
    assert!(!reloaded.loader.is_loading());
}

#[test]
fn selected_module_defaults_without_storage_file() {
    let dir = tempfile::tempdir().unwrap();
    let selected = SelectedModuleStore::new(file_store(&dir));
    assert_eq!(selected.get(), "Home");
}

#[test]
fn truncated_storage_file_recovers_on_next_selection() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("storage.json"), r#"{"selectedModule":"CR"#).unwrap();

    let selected = SelectedModuleStore::new(file_store(&dir));
    assert_eq!(selected.get(), "Home");
    selected.select("Invoices");

    let reloaded = SelectedModuleStore::new(file_store(&dir));
    assert_eq!(reloaded.get(), "Invoices");
}

#[test]
fn concurrent_firm_writes_reload_to_the_same_collection() {
    let dir = tempfile::tempdir().unwrap();
    let firms = FirmStore::new(file_store(&dir));

    let workers: Vec<_> = (0..4)
        .map(|worker| {
            let firms = firms.clone();
            std::thread::spawn(move || {
                for n in 0..25 {
                    firms.add_firm(firm(&format!("{worker}-{n}"), "Acme", n)).unwrap();
                }
            })
        })
        .collect();
    for worker in workers {
        worker.join().unwrap();
    }

    let reloaded = FirmStore::new(file_store(&dir));
    assert_eq!(firms.len(), 100);
    assert_eq!(reloaded.firms(), firms.firms());
}
