mod common;

use common::{client_for, spawn_server};
use ms3_client::{ClientError, ObjectMetadata, framing::METADATA_SIZE_HEADER};
use std::{sync::Arc, time::Duration};
use tokio::io::AsyncReadExt;

fn sample_metadata() -> ObjectMetadata {
    [("a", "1")].into_iter().collect()
}

#[tokio::test]
async fn buckets_are_listed_in_server_order_with_creation_times() {
    let (base, service) = spawn_server().await;
    let client = client_for(&base);

    let created = client.create_bucket("beta").await.unwrap();
    assert_eq!(created.name, "beta");
    assert!(created.creation_date.is_some());
    client.create_bucket("alpha").await.unwrap();

    let listed = client.list_buckets().await.unwrap();
    let names: Vec<_> = listed.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, ["alpha", "beta"]);

    for (wire, stored) in listed.iter().zip(service.list_buckets().await) {
        assert_eq!(
            wire.creation_date.map(|d| d.timestamp_millis()),
            stored.creation_date.map(|d| d.timestamp_millis())
        );
    }
}

#[tokio::test]
async fn duplicate_bucket_is_a_protocol_error() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);

    client.create_bucket("dupes").await.unwrap();
    let err = client.create_bucket("dupes").await.unwrap_err();
    assert!(err.is_protocol());
    assert_eq!(err.status(), Some(409));
    assert!(err.body().unwrap().contains("already exists"));
}

#[tokio::test]
async fn put_then_get_round_trips_metadata_and_content() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("docs").await.unwrap();

    let metadata = sample_metadata();
    let put = client
        .put_object("docs", "notes/today.txt", &b"hello world"[..], Some(&metadata))
        .await
        .unwrap();
    assert_eq!(put.metadata.as_ref(), Some(&metadata));
    assert_eq!(put.etag, Some(format!("{:x}", md5::compute(b"hello world"))));

    let mut handle = client.get_object("docs", "notes/today.txt").await.unwrap();
    assert_eq!(handle.bucket_name, "docs");
    assert_eq!(handle.key, "notes/today.txt");
    assert_eq!(handle.metadata, metadata);

    let mut content = String::new();
    handle.content().read_to_string(&mut content).await.unwrap();
    assert_eq!(content, "hello world");

    assert_eq!(
        client.get_object_metadata("docs", "notes/today.txt").await.unwrap(),
        metadata
    );
}

#[tokio::test]
async fn wire_body_is_metadata_segment_then_content() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("bkt").await.unwrap();

    let metadata = sample_metadata();
    let encoded = metadata.to_vec().unwrap();
    assert_eq!(encoded, br#"{"a":"1"}"#);
    client
        .put_object("bkt", "k", &b"payload"[..], Some(&metadata))
        .await
        .unwrap();

    let response = reqwest::get(format!("{}api/bucket/object/bkt/k", base))
        .await
        .unwrap();
    assert_eq!(
        response.headers()[&METADATA_SIZE_HEADER].to_str().unwrap(),
        encoded.len().to_string()
    );
    let body = response.bytes().await.unwrap();
    assert_eq!(&body[..encoded.len()], &encoded[..]);
    assert_eq!(&body[encoded.len()..], b"payload");
}

#[tokio::test]
async fn objects_without_metadata_have_an_empty_segment() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("bare").await.unwrap();

    client.put_object("bare", "k", &b"raw"[..], None).await.unwrap();

    let response = reqwest::get(format!("{}api/bucket/object/bare/k", base))
        .await
        .unwrap();
    assert_eq!(response.headers()[&METADATA_SIZE_HEADER], "0");

    let (metadata, content) = client.get_object("bare", "k").await.unwrap().into_parts();
    assert!(metadata.is_empty());
    assert_eq!(content.bytes().await.unwrap(), b"raw");
    assert!(client.get_object_metadata("bare", "k").await.unwrap().is_empty());
}

#[tokio::test]
async fn large_objects_stream_through_intact() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("big").await.unwrap();

    let payload: Vec<u8> = (0..3 * 1024 * 1024 + 17).map(|i| (i % 251) as u8).collect();
    let mut metadata = ObjectMetadata::new();
    metadata.set_content_length(payload.len() as u64);
    client
        .put_object("big", "blob.bin", std::io::Cursor::new(payload.clone()), Some(&metadata))
        .await
        .unwrap();

    let handle = client.get_object("big", "blob.bin").await.unwrap();
    assert_eq!(handle.metadata.content_length(), Some(payload.len() as u64));
    assert_eq!(handle.into_content().bytes().await.unwrap(), payload);
}

#[tokio::test]
async fn list_objects_prepends_prefix_to_bucket_segment() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("logs").await.unwrap();
    for key in ["2024/jan", "2025/feb", "2025/mar"] {
        client.put_object_from_str("logs", key, key).await.unwrap();
    }

    let all = client.list_objects("logs", None).await.unwrap();
    assert_eq!(all.len(), 3);
    assert!(all.iter().all(|o| o.bucket_name == "logs"));
    assert_eq!(all[1].size, "2025/feb".len() as u64);

    let filtered = client.list_objects("logs", Some("2025/")).await.unwrap();
    let keys: Vec<_> = filtered.iter().map(|o| o.key.as_str()).collect();
    assert_eq!(keys, ["2025/feb", "2025/mar"]);
}

#[tokio::test]
async fn string_helpers_set_text_metadata() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("text").await.unwrap();

    client
        .put_object_from_str("text", "greeting", "héllo")
        .await
        .unwrap();

    let metadata = client.get_object_metadata("text", "greeting").await.unwrap();
    assert_eq!(metadata.content_type(), Some("text/plain"));
    assert_eq!(metadata.content_length(), Some("héllo".len() as u64));
    assert_eq!(
        client.get_object_as_string("text", "greeting").await.unwrap(),
        "héllo"
    );
}

#[tokio::test]
async fn file_upload_and_download() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("files").await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let source = dir.path().join("source.txt");
    tokio::fs::write(&source, b"file contents").await.unwrap();

    let mut metadata = ObjectMetadata::new();
    metadata.add_user_metadata("origin", "disk");
    client
        .put_object_from_file("files", "copy.txt", &source, Some(&metadata))
        .await
        .unwrap();

    let destination = dir.path().join("downloaded.txt");
    let fetched = client
        .get_object_to_file("files", "copy.txt", &destination)
        .await
        .unwrap();
    assert_eq!(fetched.user_metadata("origin"), Some("disk"));
    assert_eq!(tokio::fs::read(&destination).await.unwrap(), b"file contents");
}

#[tokio::test]
async fn missing_source_file_is_an_io_error() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);

    let err = client
        .put_object_from_file("files", "k", "/definitely/not/here", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ClientError::Io(_)));
    assert!(err.is_transport());
}

#[tokio::test]
async fn access_url_resolves_against_server_url() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("pub").await.unwrap();
    client.put_object_from_str("pub", "a/b.txt", "x").await.unwrap();

    let url = client.get_access_url("pub", "a/b.txt").await.unwrap();
    assert_eq!(url.as_str(), format!("{}api/bucket/object/pub/a/b.txt", base));

    let fetched = reqwest::get(url).await.unwrap();
    assert!(fetched.status().is_success());
}

#[tokio::test]
async fn access_url_for_missing_object_is_none() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("pub").await.unwrap();

    assert!(client.get_access_url("pub", "missing").await.is_none());
    let err = client.try_access_url("pub", "missing").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn missing_objects_are_protocol_errors() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);

    let err = client.get_object("nobucket", "k").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    let err = client.list_objects("nobucket", None).await.unwrap_err();
    assert_eq!(err.status(), Some(404));
    let err = client.get_object_metadata("nobucket", "k").await.unwrap_err();
    assert_eq!(err.status(), Some(404));
}

#[tokio::test]
async fn waiters_see_resources_created_later() {
    let (base, service) = spawn_server().await;
    let client = client_for(&base);

    let creator = service.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        creator.create_bucket("late").await.unwrap();
    });
    client.wait_until_bucket_exists("late").await.unwrap();

    let writer = client_for(&base);
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        writer.put_object_from_str("late", "k", "v").await.unwrap();
    });
    client.wait_until_object_exists("late", "k").await.unwrap();
}

#[tokio::test]
async fn waiting_for_a_bucket_that_never_appears_times_out() {
    let (base, _) = spawn_server().await;
    let client = ms3_client::ClientBuilder::default()
        .server_url(&base)
        .waiter_config(ms3_client::WaiterConfig {
            delay: Duration::from_millis(1),
            max_attempts: 3,
        })
        .build()
        .unwrap();

    let err = client.wait_until_bucket_exists("ghost").await.unwrap_err();
    assert!(matches!(err, ClientError::WaitTimeout { attempts: 3, .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn shared_client_serves_concurrent_callers() {
    let (base, _) = spawn_server().await;
    let client = Arc::new(client_for(&base));
    client.create_bucket("shared").await.unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            let client = Arc::clone(&client);
            tokio::spawn(async move {
                let key = format!("obj-{}", i);
                let body = format!("body-{}", i);
                let mut metadata = ObjectMetadata::new();
                metadata.insert("index", i);
                client
                    .put_object("shared", &key, std::io::Cursor::new(body.clone().into_bytes()), Some(&metadata))
                    .await
                    .unwrap();

                let handle = client.get_object("shared", &key).await.unwrap();
                assert_eq!(handle.metadata.get("index"), Some(&serde_json::json!(i)));
                assert_eq!(handle.into_content().bytes().await.unwrap(), body.into_bytes());
            })
        })
        .collect();

    for task in tasks {
        task.await.unwrap();
    }
    assert_eq!(client.list_objects("shared", None).await.unwrap().len(), 16);
}

#[tokio::test]
async fn health_endpoint_reports_bucket_count() {
    let (base, service) = spawn_server().await;
    service.create_bucket("one").await.unwrap();

    let body: serde_json::Value = reqwest::get(format!("{}healthz", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["buckets"], 1);
}

#[tokio::test]
async fn keys_with_reserved_characters_stay_distinct() {
    let (base, _) = spawn_server().await;
    let client = client_for(&base);
    client.create_bucket("bkt").await.unwrap();

    let keys = ["a", "a?b", "a#b", "100%", "my file", "dir/a?x=1"];
    for key in keys {
        client
            .put_object_from_str("bkt", key, &format!("content of {}", key))
            .await
            .unwrap();
    }

    let listed = client.list_objects("bkt", None).await.unwrap();
    let mut listed_keys: Vec<_> = listed.iter().map(|o| o.key.as_str()).collect();
    listed_keys.sort_unstable();
    let mut expected = keys.to_vec();
    expected.sort_unstable();
    assert_eq!(listed_keys, expected);

    for key in keys {
        assert_eq!(
            client.get_object_as_string("bkt", key).await.unwrap(),
            format!("content of {}", key)
        );
    }

    let url = client.get_access_url("bkt", "a?b").await.unwrap();
    assert_eq!(url.as_str(), format!("{}api/bucket/object/bkt/a%3Fb", base));
    let body = reqwest::get(url).await.unwrap().bytes().await.unwrap();
    assert!(body.ends_with(b"content of a?b"));
}

#[tokio::test]
async fn server_rejects_oversized_metadata_header() {
    let (base, service) = spawn_server().await;
    service.create_bucket("bkt").await.unwrap();

    let response = reqwest::Client::new()
        .put(format!("{}api/bucket/object/bkt/k", base))
        .header(METADATA_SIZE_HEADER, "18446744073709551615")
        .body("{}content")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
    assert!(service.get_object("bkt", "k").await.is_err());
}
