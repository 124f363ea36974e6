use site_host::registry::{ProjectResolver, Registry, RegistryError};

fn test_registry() -> (tempfile::TempDir, Registry) {
    let dir = tempfile::tempdir().unwrap();
    let registry = Registry::open(dir.path().join("data")).unwrap();
    (dir, registry)
}

fn hosts(list: &[&str]) -> Vec<String> {
    list.iter().map(|h| h.to_string()).collect()
}

#[test]
fn test_create_and_get_project() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project("My Cool Site", "#ff8800", &hosts(&["cool.example.com"]))
        .unwrap();
    assert_eq!(created.name, "My Cool Site");
    assert_eq!(created.color, "#ff8800");
    assert_eq!(created.folder, "my-cool-site");
    assert_eq!(created.hosts, vec!["cool.example.com"]);

    let fetched = registry
        .get_project(&created.id)
        .unwrap()
        .expect("project should exist");
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.folder, "my-cool-site");
}

#[test]
fn test_get_project_not_found() {
    let (_dir, registry) = test_registry();
    assert!(registry.get_project("nonexistent").unwrap().is_none());
}

#[test]
fn test_folder_collisions_get_numeric_suffixes() {
    let (_dir, registry) = test_registry();

    let first = registry
        .create_project("Demo", "", &hosts(&["a.test"]))
        .unwrap();
    let second = registry
        .create_project("Demo", "", &hosts(&["b.test"]))
        .unwrap();
    let third = registry
        .create_project("demo!", "", &hosts(&["c.test"]))
        .unwrap();

    assert_eq!(first.folder, "demo");
    assert_eq!(second.folder, "demo-1");
    assert_eq!(third.folder, "demo-2");
}

#[test]
fn test_deleted_folder_is_reusable() {
    let (_dir, registry) = test_registry();

    let first = registry
        .create_project("Demo", "", &hosts(&["a.test"]))
        .unwrap();
    assert_eq!(first.folder, "demo");
    assert!(registry.delete_project(&first.id).unwrap());

    let second = registry
        .create_project("Demo", "", &hosts(&["b.test"]))
        .unwrap();
    assert_eq!(second.folder, "demo");
}

#[test]
fn test_get_project_by_host() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project("Demo", "", &hosts(&["demo.test", "www.demo.test"]))
        .unwrap();

    let by_first = registry
        .get_project_by_host("demo.test")
        .unwrap()
        .expect("should resolve");
    assert_eq!(by_first.id, created.id);

    let by_second = registry
        .get_project_by_host("www.demo.test")
        .unwrap()
        .expect("should resolve");
    assert_eq!(by_second.id, created.id);

    assert!(registry.get_project_by_host("other.test").unwrap().is_none());
}

#[test]
fn test_host_matching_is_case_insensitive() {
    let (_dir, registry) = test_registry();

    registry
        .create_project("Demo", "", &hosts(&["Demo.Example.COM"]))
        .unwrap();

    assert!(registry
        .get_project_by_host("demo.example.com")
        .unwrap()
        .is_some());
    assert!(registry
        .get_project_by_host("DEMO.EXAMPLE.COM")
        .unwrap()
        .is_some());
}

#[test]
fn test_duplicate_host_rejected() {
    let (_dir, registry) = test_registry();

    registry
        .create_project("First", "", &hosts(&["taken.test"]))
        .unwrap();

    let result = registry.create_project("Second", "", &hosts(&["taken.test"]));
    assert!(matches!(result, Err(RegistryError::HostInUse(host)) if host == "taken.test"));
}

#[test]
fn test_update_project_fields() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project("Old Name", "#000000", &hosts(&["old.test"]))
        .unwrap();

    let updated = registry
        .update_project(&created.id, Some("New Name"), Some("#ffffff"), None)
        .unwrap()
        .expect("project should exist");
    assert_eq!(updated.name, "New Name");
    assert_eq!(updated.color, "#ffffff");
    // Folder never changes after creation.
    assert_eq!(updated.folder, "old-name");
    assert_eq!(updated.hosts, vec!["old.test"]);
}

#[test]
fn test_update_project_hosts_rewrites_index() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project("Demo", "", &hosts(&["old.test"]))
        .unwrap();

    registry
        .update_project(&created.id, None, None, Some(&hosts(&["new.test"])))
        .unwrap()
        .expect("project should exist");

    assert!(registry.get_project_by_host("old.test").unwrap().is_none());
    let resolved = registry
        .get_project_by_host("new.test")
        .unwrap()
        .expect("new host should resolve");
    assert_eq!(resolved.id, created.id);
}

#[test]
fn test_update_project_keeps_own_hosts() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project("Demo", "", &hosts(&["keep.test"]))
        .unwrap();

    // Re-submitting an already-owned host is not a conflict.
    let updated = registry
        .update_project(
            &created.id,
            None,
            None,
            Some(&hosts(&["keep.test", "extra.test"])),
        )
        .unwrap()
        .expect("project should exist");
    assert_eq!(updated.hosts, vec!["keep.test", "extra.test"]);
}

#[test]
fn test_update_project_host_conflict() {
    let (_dir, registry) = test_registry();

    registry
        .create_project("First", "", &hosts(&["first.test"]))
        .unwrap();
    let second = registry
        .create_project("Second", "", &hosts(&["second.test"]))
        .unwrap();

    let result = registry.update_project(&second.id, None, None, Some(&hosts(&["first.test"])));
    assert!(matches!(result, Err(RegistryError::HostInUse(_))));

    // The failed update must not have touched the existing index.
    assert!(registry.get_project_by_host("second.test").unwrap().is_some());
}

#[test]
fn test_update_project_not_found() {
    let (_dir, registry) = test_registry();
    assert!(registry
        .update_project("nonexistent", Some("Name"), None, None)
        .unwrap()
        .is_none());
}

#[test]
fn test_delete_project_cleans_indexes() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project("Demo", "", &hosts(&["demo.test"]))
        .unwrap();

    assert!(registry.delete_project(&created.id).unwrap());
    assert!(registry.get_project(&created.id).unwrap().is_none());
    assert!(registry.get_project_by_host("demo.test").unwrap().is_none());
}

#[test]
fn test_delete_project_not_found() {
    let (_dir, registry) = test_registry();
    assert!(!registry.delete_project("nonexistent").unwrap());
}

#[test]
fn test_list_projects() {
    let (_dir, registry) = test_registry();

    registry.create_project("A", "", &hosts(&["a.test"])).unwrap();
    registry.create_project("B", "", &hosts(&["b.test"])).unwrap();

    let projects = registry.list_projects().unwrap();
    assert_eq!(projects.len(), 2);
}

#[test]
fn test_hosts_are_deduped_and_normalized() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project(
            "Demo",
            "",
            &hosts(&["Demo.Test", "demo.test", " demo.test ", ""]),
        )
        .unwrap();
    assert_eq!(created.hosts, vec!["demo.test"]);
}

#[test]
fn test_resolver_trait_lookups() {
    let (_dir, registry) = test_registry();

    let created = registry
        .create_project("Demo", "", &hosts(&["demo.test"]))
        .unwrap();

    let resolver: &dyn ProjectResolver = &registry;
    let by_host = resolver
        .find_project_by_host("demo.test")
        .unwrap()
        .expect("host should resolve");
    assert_eq!(by_host.id, created.id);

    let by_id = resolver
        .find_project_by_id(&created.id)
        .unwrap()
        .expect("id should resolve");
    assert_eq!(by_id.folder, by_host.folder);

    assert!(resolver.find_project_by_host("missing.test").unwrap().is_none());
}
