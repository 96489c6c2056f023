use serde_json::json;

use crate::common::{TRAFFIC_COUNTS, TestApp, routes};

mod verification {
    use super::*;

    #[tokio::test]
    async fn matching_copy_is_verified() {
        let app = TestApp::spawn().await;
        let dataset = app
            .upload("Traffic Counts", "traffic_counts.csv", TRAFFIC_COUNTS)
            .await;
        let id = dataset["id"].as_str().unwrap();
        let link = app.mirror.host("copy.csv", TRAFFIC_COUNTS);

        let res = app.contribute(id, "ada@example.org", &link).await;

        assert_eq!(res.status, 200, "{}", res.text());
        assert_eq!(res.message(), "Contributor verified and saved");
        let listed = app.listed(id).await.unwrap();
        assert_eq!(listed["verifiedHostCount"], 1);
        assert_eq!(listed["state"], "distributing");
    }

    #[tokio::test]
    async fn mismatched_copy_is_rejected_without_side_effects() {
        let app = TestApp::spawn().await;
        let dataset = app
            .upload("Traffic Counts", "traffic_counts.csv", TRAFFIC_COUNTS)
            .await;
        let id = dataset["id"].as_str().unwrap();
        let link = app.mirror.host("tampered.csv", b"intersection,hour,count\n");

        let res = app.contribute(id, "mallory@example.org", &link).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VERIFICATION_FAILED");
        assert_eq!(app.listed(id).await.unwrap()["verifiedHostCount"], 0);
        assert!(!app.data_path().join("contributors.json").exists());
    }

    #[tokio::test]
    async fn unreachable_copy_is_a_verification_failure() {
        let app = TestApp::spawn().await;
        let dataset = app.upload("Counts", "c.csv", TRAFFIC_COUNTS).await;
        let id = dataset["id"].as_str().unwrap();

        let res = app
            .contribute(id, "ada@example.org", &app.mirror.link("missing.csv"))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VERIFICATION_FAILED");
        assert_eq!(app.listed(id).await.unwrap()["verifiedHostCount"], 0);
    }

    #[tokio::test]
    async fn non_http_link_is_a_verification_failure() {
        let app = TestApp::spawn().await;
        let dataset = app.upload("Counts", "c.csv", TRAFFIC_COUNTS).await;
        let id = dataset["id"].as_str().unwrap();

        let res = app
            .contribute(id, "ada@example.org", "file:///etc/passwd")
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VERIFICATION_FAILED");
    }

    #[tokio::test]
    async fn unknown_dataset_is_not_found() {
        let app = TestApp::spawn().await;
        let link = app.mirror.host("copy.csv", TRAFFIC_COUNTS);

        let res = app.contribute("does-not-exist", "ada@example.org", &link).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let app = TestApp::spawn().await;
        let dataset = app.upload("Counts", "c.csv", TRAFFIC_COUNTS).await;

        let res = app
            .post(
                routes::CONTRIBUTE,
                &json!({ "datasetId": dataset["id"], "name": "Ada" }),
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn same_email_counts_once() {
        let app = TestApp::spawn().await;
        let dataset = app.upload("Counts", "c.csv", TRAFFIC_COUNTS).await;
        let id = dataset["id"].as_str().unwrap();
        let first = app.mirror.host("one.csv", TRAFFIC_COUNTS);
        let second = app.mirror.host("two.csv", TRAFFIC_COUNTS);

        assert_eq!(app.contribute(id, "ada@example.org", &first).await.status, 200);
        assert_eq!(app.contribute(id, "ada@example.org", &second).await.status, 200);

        assert_eq!(app.listed(id).await.unwrap()["verifiedHostCount"], 1);
        let claims: serde_json::Value = serde_json::from_slice(
            &std::fs::read(app.data_path().join("contributors.json")).unwrap(),
        )
        .unwrap();
        assert_eq!(claims.as_array().unwrap().len(), 1);
        assert_eq!(claims[0]["hostLink"], first);
    }

    #[tokio::test]
    async fn one_email_may_host_several_datasets() {
        let app = TestApp::spawn().await;
        let a = app.upload("A", "a.csv", b"aaa").await;
        let b = app.upload("B", "b.csv", b"bbb").await;
        let link_a = app.mirror.host("a.csv", b"aaa");
        let link_b = app.mirror.host("b.csv", b"bbb");

        let a_id = a["id"].as_str().unwrap();
        let b_id = b["id"].as_str().unwrap();
        assert_eq!(app.contribute(a_id, "ada@example.org", &link_a).await.status, 200);
        assert_eq!(app.contribute(b_id, "ada@example.org", &link_b).await.status, 200);

        assert_eq!(app.listed(a_id).await.unwrap()["verifiedHostCount"], 1);
        assert_eq!(app.listed(b_id).await.unwrap()["verifiedHostCount"], 1);
    }
}

mod threshold {
    use super::*;

    #[tokio::test]
    async fn fifth_contributor_delists_traffic_counts() {
        let app = TestApp::spawn().await;
        let dataset = app
            .upload("Traffic Counts", "traffic_counts.csv", TRAFFIC_COUNTS)
            .await;
        let id = dataset["id"].as_str().unwrap();
        let stored = app.stored_file(dataset["storedFilename"].as_str().unwrap());

        let mut links = Vec::new();
        for i in 1..=5 {
            let link = app.mirror.host(&format!("copy-{i}.csv"), TRAFFIC_COUNTS);
            let res = app
                .contribute(id, &format!("host{i}@example.org"), &link)
                .await;
            assert_eq!(res.status, 200, "contributor {i}: {}", res.text());
            assert_eq!(stored.exists(), i < 5, "after contributor {i}");
            links.push(link);
        }

        let listed = app.listed(id).await.unwrap();
        assert_eq!(listed["verifiedHostCount"], 5);
        assert_eq!(listed["state"], "delisted");

        let res = app.get(&routes::file(id)).await;
        assert_eq!(res.status, 302);
        let location = res.header("location").unwrap().to_string();
        assert!(links.contains(&location), "{location}");
    }

    #[tokio::test]
    async fn four_contributors_keep_the_local_copy() {
        let app = TestApp::spawn().await;
        let dataset = app.upload("Counts", "c.csv", TRAFFIC_COUNTS).await;
        let id = dataset["id"].as_str().unwrap();

        for i in 1..=4 {
            let link = app.mirror.host(&format!("copy-{i}.csv"), TRAFFIC_COUNTS);
            let res = app
                .contribute(id, &format!("host{i}@example.org"), &link)
                .await;
            assert_eq!(res.status, 200, "contributor {i}: {}", res.text());
        }

        let listed = app.listed(id).await.unwrap();
        assert_eq!(listed["verifiedHostCount"], 4);
        assert_eq!(listed["state"], "distributing");

        let res = app.get(&routes::file(id)).await;
        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, TRAFFIC_COUNTS);
    }

    #[tokio::test]
    async fn contributions_continue_after_delisting() {
        let app = TestApp::spawn().await;
        let dataset = app.upload("Counts", "c.csv", TRAFFIC_COUNTS).await;
        let id = dataset["id"].as_str().unwrap();

        for i in 1..=6 {
            let link = app.mirror.host(&format!("copy-{i}.csv"), TRAFFIC_COUNTS);
            let res = app
                .contribute(id, &format!("host{i}@example.org"), &link)
                .await;
            assert_eq!(res.status, 200, "contributor {i}: {}", res.text());
        }

        let listed = app.listed(id).await.unwrap();
        assert_eq!(listed["verifiedHostCount"], 6);
        assert_eq!(listed["state"], "delisted");
    }
}
