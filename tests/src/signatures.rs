use std::fs;

use lift_core::SignatureStore;
use serde_json::json;
use tempfile::tempdir;

fn http_document(server: &str, display_name: &str) -> String {
    json!({
        "http_response_info": [
            { "server_search_text": server, "title_search_text": "", "display_name": display_name }
        ]
    })
    .to_string()
}

#[test]
fn malformed_file_is_skipped_and_the_rest_load() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("a_hikvision.json"), http_document("DVRDVS-Webs", "Hikvision DVR")).unwrap();
    fs::write(dir.path().join("b_broken.json"), "{ \"http_response_info\": [").unwrap();
    fs::write(dir.path().join("c_zyxel.json"), http_document("RomPager", "ZyXEL Router")).unwrap();
    fs::write(dir.path().join("notes.txt"), "not a signature file").unwrap();

    let store = SignatureStore::load_dir(dir.path()).unwrap();

    assert_eq!(store.sources_loaded(), 2);
    assert_eq!(store.sources_skipped(), 1);
    assert_eq!(store.len(), 2);
    assert_eq!(store.lookup_by_http(None, Some("DVRDVS-Webs")), Some("Hikvision DVR"));
    assert_eq!(store.lookup_by_http(Some("Login"), Some("RomPager/4.07")), Some("ZyXEL Router"));
}

#[test]
fn files_load_in_name_order() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("2_generic.json"), http_document("GoAhead", "Generic")).unwrap();
    fs::write(dir.path().join("1_specific.json"), http_document("GoAhead-Webs", "Specific")).unwrap();

    let store = SignatureStore::load_dir(dir.path()).unwrap();

    assert_eq!(store.lookup_by_http(None, Some("GoAhead-Webs")), Some("Specific"));
}

#[test]
fn missing_directory_is_a_setup_error() {
    let dir = tempdir().unwrap();
    assert!(SignatureStore::load_dir(&dir.path().join("cert_collection")).is_err());
}

#[test]
fn empty_directory_gives_empty_store() {
    let dir = tempdir().unwrap();
    let store = SignatureStore::load_dir(dir.path()).unwrap();
    assert!(store.is_empty());
}
