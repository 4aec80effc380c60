use patchline_lib::config::{RemoteOptions, StoreError, find_duplicate_versions, load_remote};
use patchline_lib::resolve::{ResolutionContext, resolve};
use patchline_lib::version::UpdateVersion;

use super::common::record;

#[tokio::test]
async fn remote_catalog_feeds_resolution() {
  let mut server = mockito::Server::new_async().await;
  let body = serde_json::to_string(&vec![record("1.0.0.0"), record("1.1.0.0")]).unwrap();
  let mock = server
    .mock("GET", "/example/updates.json")
    .with_status(200)
    .with_header("content-type", "application/json")
    .with_body(body)
    .create_async()
    .await;

  let url = format!("{}/example/updates.json", server.url());
  let records = load_remote(&url, &RemoteOptions::default()).await.unwrap().unwrap();

  mock.assert_async().await;
  let ctx = ResolutionContext::new(UpdateVersion::parse("1.0.0.0").unwrap());
  assert_eq!(resolve(&records, &ctx).best.unwrap().literal_version, "1.1.0.0");
}

#[tokio::test]
async fn empty_remote_body_is_absent() {
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("GET", "/updates.json")
    .with_status(200)
    .with_body("")
    .create_async()
    .await;

  let url = format!("{}/updates.json", server.url());
  assert!(load_remote(&url, &RemoteOptions::default()).await.unwrap().is_none());
}

#[tokio::test]
async fn remote_http_error_is_fetch_error() {
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("GET", "/updates.json")
    .with_status(404)
    .create_async()
    .await;

  let url = format!("{}/updates.json", server.url());
  let options = RemoteOptions {
    accept_invalid_certs: false,
    ..RemoteOptions::default()
  };
  let err = load_remote(&url, &options).await.unwrap_err();
  assert!(matches!(err, StoreError::Fetch { .. }));
}

#[tokio::test]
async fn malformed_remote_document_is_parse_error() {
  let mut server = mockito::Server::new_async().await;
  let _mock = server
    .mock("GET", "/updates.json")
    .with_status(200)
    .with_body("<html>maintenance</html>")
    .create_async()
    .await;

  let url = format!("{}/updates.json", server.url());
  let err = load_remote(&url, &RemoteOptions::default()).await.unwrap_err();
  assert!(matches!(err, StoreError::Parse(_)));
}

#[test]
fn duplicate_versions_are_reported() {
  let records = vec![record("1.0.0.0"), record("1.1.0.0b1"), record("1.1.0.0-beta.1")];

  let dups = find_duplicate_versions(&records);

  assert_eq!(dups.len(), 1);
  assert_eq!(dups[0].version.render(), "1.1.0.0b1");
  assert_eq!(dups[0].positions, vec![1, 2]);
}
