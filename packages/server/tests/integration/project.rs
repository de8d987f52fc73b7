mod project_creation {
    use crate::common::{ADMIN_TOKEN, TestApp, project_form, routes};

    #[tokio::test]
    async fn upload_creates_project_with_linked_file() {
        let app = TestApp::spawn().await;

        let form = project_form("Archive A", "design documents", Some(("report.pdf", b"pdf")));
        let res = app
            .post_form_with_token(routes::PROJECTS, form, ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        assert_eq!(res.body["name"], "Archive A");
        assert_eq!(res.body["description"], "design documents");
        assert!(res.body["blob_id"].is_string());

        let fetched = app.get(&routes::project(&res.id())).await;
        assert_eq!(fetched.status, 200);
        assert_eq!(fetched.body["name"], "Archive A");
    }

    #[tokio::test]
    async fn upload_without_token_is_rejected() {
        let app = TestApp::spawn().await;

        let form = project_form("Archive A", "d", Some(("f.bin", b"data")));
        let res = app.post_form_without_token(routes::PROJECTS, form).await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_MISSING");
    }

    #[tokio::test]
    async fn upload_with_wrong_token_is_rejected() {
        let app = TestApp::spawn().await;

        let form = project_form("Archive A", "d", Some(("f.bin", b"data")));
        let res = app
            .post_form_with_token(routes::PROJECTS, form, "not-the-admin-token")
            .await;

        assert_eq!(res.status, 401);
        assert_eq!(res.code(), "TOKEN_INVALID");
    }

    #[tokio::test]
    async fn upload_without_file_persists_nothing() {
        let app = TestApp::spawn().await;

        let form = project_form("Archive A", "d", None);
        let res = app
            .post_form_with_token(routes::PROJECTS, form, ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");

        let list = app.get(routes::PROJECTS).await;
        assert_eq!(list.body["total"], 0);
    }

    #[tokio::test]
    async fn upload_with_missing_fields_names_them() {
        let app = TestApp::spawn().await;

        let form = project_form("", "", Some(("f.bin", b"data")));
        let res = app
            .post_form_with_token(routes::PROJECTS, form, ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert_eq!(
            res.body["message"],
            "Missing required fields: name, description"
        );
    }

    #[tokio::test]
    async fn oversized_upload_is_rejected() {
        let app = TestApp::spawn().await;

        let too_big = vec![0u8; 10 * 1024 * 1024 + 1];
        let form = project_form("Huge", "d", Some(("huge.bin", &too_big)));
        let res = app
            .post_form_with_token(routes::PROJECTS, form, ADMIN_TOKEN)
            .await;

        assert_eq!(res.status, 400, "unexpected: {}", res.text);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod project_listing {
    use crate::common::{TestApp, routes};

    #[tokio::test]
    async fn list_returns_all_projects() {
        let app = TestApp::spawn().await;
        app.create_project("First", "a.bin", b"a").await;
        app.create_project("Second", "b.bin", b"b").await;

        let res = app.get(routes::PROJECTS).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        assert_eq!(res.body["projects"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn search_matches_case_insensitive_substring() {
        let app = TestApp::spawn().await;
        app.create_project("Archive A", "a.bin", b"a").await;
        app.create_project("archive b", "b.bin", b"b").await;
        app.create_project("Other", "c.bin", b"c").await;

        let res = app.get(&format!("{}?search=Arc", routes::PROJECTS)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
        let names: Vec<&str> = res.body["projects"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Archive A", "archive b"]);
    }

    #[tokio::test]
    async fn empty_search_returns_everything() {
        let app = TestApp::spawn().await;
        app.create_project("Archive A", "a.bin", b"a").await;
        app.create_project("Other", "c.bin", b"c").await;

        let res = app.get(&format!("{}?search=", routes::PROJECTS)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 2);
    }

    #[tokio::test]
    async fn search_with_no_match_returns_empty_list() {
        let app = TestApp::spawn().await;
        app.create_project("Archive A", "a.bin", b"a").await;

        let res = app
            .get(&format!("{}?search=zzz-nothing", routes::PROJECTS))
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["total"], 0);
    }
}

mod project_detail {
    use crate::common::{TestApp, routes};

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .get(&routes::project(&uuid::Uuid::now_v7().to_string()))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn malformed_id_is_a_validation_error() {
        let app = TestApp::spawn().await;

        let res = app.get(&routes::project("not-a-uuid")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
    }
}

mod project_update {
    use crate::common::{TestApp, project_form, routes};

    #[tokio::test]
    async fn edit_without_file_keeps_existing_blob() {
        let app = TestApp::spawn().await;
        let id = app.create_project("Before", "v1.bin", b"version one").await;
        let original = app.get(&routes::project(&id)).await;

        let res = app
            .put_form(&routes::project(&id), project_form("After", "updated", None))
            .await;

        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert_eq!(res.body["name"], "After");
        assert_eq!(res.body["description"], "updated");
        assert_eq!(res.body["blob_id"], original.body["blob_id"]);
    }

    #[tokio::test]
    async fn edit_with_file_replaces_blob() {
        let app = TestApp::spawn().await;
        let id = app.create_project("Archive", "v1.bin", b"version one").await;
        let original = app.get(&routes::project(&id)).await;

        let form = project_form("Archive", "d", Some(("v2.bin", b"version two")));
        let res = app.put_form(&routes::project(&id), form).await;

        assert_eq!(res.status, 200, "update failed: {}", res.text);
        assert!(res.body["blob_id"].is_string());
        assert_ne!(res.body["blob_id"], original.body["blob_id"]);

        let download = app.get_raw(&routes::download(&id)).await;
        assert_eq!(download.bytes().await.unwrap().as_ref(), b"version two");
    }

    #[tokio::test]
    async fn edit_with_missing_fields_is_rejected() {
        let app = TestApp::spawn().await;
        let id = app.create_project("Archive", "f.bin", b"data").await;

        let res = app
            .put_form(&routes::project(&id), project_form("", "still here", None))
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "VALIDATION_ERROR");
        assert_eq!(res.body["message"], "Missing required fields: name");
    }

    #[tokio::test]
    async fn edit_of_missing_project_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .put_form(
                &routes::project(&uuid::Uuid::now_v7().to_string()),
                project_form("Name", "desc", None),
            )
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }
}

mod project_deletion {
    use crate::common::{TestApp, routes};

    #[tokio::test]
    async fn delete_removes_record_and_file() {
        let app = TestApp::spawn().await;
        let id = app.create_project("Doomed", "f.bin", b"data").await;

        let res = app.delete(&routes::project(&id)).await;
        assert_eq!(res.status, 204);

        let fetched = app.get(&routes::project(&id)).await;
        assert_eq!(fetched.status, 404);
        assert_eq!(fetched.code(), "NOT_FOUND");

        let download = app.get(&routes::download(&id)).await;
        assert_eq!(download.status, 404);
    }

    #[tokio::test]
    async fn delete_of_missing_project_is_not_found() {
        let app = TestApp::spawn().await;

        let res = app
            .delete(&routes::project(&uuid::Uuid::now_v7().to_string()))
            .await;

        assert_eq!(res.status, 404);
        assert_eq!(res.code(), "NOT_FOUND");
    }

    #[tokio::test]
    async fn delete_is_not_repeatable() {
        let app = TestApp::spawn().await;
        let id = app.create_project("Once", "f.bin", b"data").await;

        assert_eq!(app.delete(&routes::project(&id)).await.status, 204);
        assert_eq!(app.delete(&routes::project(&id)).await.status, 404);
    }
}
