use std::time::Duration;

use enlighten_server::problems::{
    ProblemPatch, ProblemStore, SeaOrmProblemStore, UpdateOutcome, ValidatedSet,
};
use judge::Testcase;
use judge::testing::ScriptedJudge;
use serde_json::json;

use crate::common::{TestApp, WRONG_MARKER, problem_payload, routes};

mod create {
    use super::*;

    #[tokio::test]
    async fn admin_creates_problem_after_all_solutions_pass() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let res = app
            .post_with_token(routes::PROBLEMS, &problem_payload(), &token)
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        assert_eq!(res.body["title"], "A + B");
        assert_eq!(res.body["difficulty"], "EASY");
        assert_eq!(res.body["testcases"].as_array().unwrap().len(), 3);
        assert_eq!(res.body["testcases"][2]["index"], 3);
        assert_eq!(res.body["testcases"][2]["input"], "-1 1");
        assert_eq!(res.body["examples"][0]["explanation"], "1 + 2 = 3");

        let languages: Vec<&String> = res.body["reference_solutions"]
            .as_object()
            .unwrap()
            .keys()
            .collect();
        assert_eq!(languages.len(), 2);

        // 2 languages x 3 testcases with a batch size of 2.
        let batches = app.judge.submitted_batches();
        assert_eq!(batches.iter().map(Vec::len).sum::<usize>(), 6);
        assert!(batches.iter().all(|b| b.len() <= 2));
    }

    #[tokio::test]
    async fn failing_reference_solution_is_reported_and_nothing_is_stored() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let mut body = problem_payload();
        body["reference_solutions"]["CPP"] = json!(format!("// {WRONG_MARKER}"));

        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.body["code"], "TESTCASE_FAILED");
        assert_eq!(res.body["message"], "Testcase 1 failed for language CPP");
        assert_eq!(res.body["details"]["testcase"], 1);
        assert_eq!(res.body["details"]["status"], "WrongAnswer");

        let list = app.get_with_token(routes::PROBLEMS, &token).await;
        assert_eq!(list.body["pagination"]["total"], 0);
    }

    #[tokio::test]
    async fn unsupported_language_is_rejected_before_any_judge_call() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let mut body = problem_payload();
        body["reference_solutions"]["BRAINFUCK"] = json!("+[]");

        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "UNSUPPORTED_LANGUAGE");
        assert_eq!(app.judge.submit_calls(), 0);
    }

    #[tokio::test]
    async fn requires_testcases_and_reference_solutions() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let mut body = problem_payload();
        body["testcases"] = json!([]);
        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");

        let mut body = problem_payload();
        body["reference_solutions"] = json!({});
        let res = app.post_with_token(routes::PROBLEMS, &body, &token).await;
        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn regular_user_cannot_create_problems() {
        let app = TestApp::spawn().await;
        let token = app
            .create_authenticated_user("user@example.com", "userpass1")
            .await;

        let res = app
            .post_with_token(routes::PROBLEMS, &problem_payload(), &token)
            .await;

        assert_eq!(res.status, 403);
        assert_eq!(res.body["code"], "PERMISSION_DENIED");
    }

    #[tokio::test]
    async fn unreachable_judge_is_a_gateway_error() {
        let app = TestApp::spawn_with_judge(ScriptedJudge::accepting().rejecting_submissions()).await;
        let token = app.create_admin().await;

        let res = app
            .post_with_token(routes::PROBLEMS, &problem_payload(), &token)
            .await;

        assert_eq!(res.status, 502);
        assert_eq!(res.body["code"], "JUDGE_UNAVAILABLE");
    }

    #[tokio::test]
    async fn shutdown_cancels_in_flight_validation() {
        let app = TestApp::spawn_with_judge(ScriptedJudge::accepting().never_finishing()).await;
        let token = app.create_admin().await;

        let request = app
            .client
            .post(app.url(routes::PROBLEMS))
            .header("Authorization", format!("Bearer {token}"))
            .json(&problem_payload())
            .send();
        let shutdown = app.shutdown.clone();
        let (res, _) = tokio::join!(request, async move {
            tokio::time::sleep(Duration::from_millis(300)).await;
            shutdown.cancel();
        });

        let res = res.unwrap();
        assert_eq!(res.status().as_u16(), 503);
        let body: serde_json::Value = res.json().await.unwrap();
        assert_eq!(body["code"], "JUDGE_UNAVAILABLE");
    }
}

mod read {
    use super::*;

    #[tokio::test]
    async fn any_authenticated_user_can_read_a_problem() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_problem(&admin, "Readable").await;
        let user = app
            .create_authenticated_user("user@example.com", "userpass1")
            .await;

        let res = app.get_with_token(&routes::problem(id), &user).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["id"], id);
        assert_eq!(res.body["testcases"][0]["output"], "3");
    }

    #[tokio::test]
    async fn missing_problem_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let res = app.get_with_token(&routes::problem(9999), &token).await;

        assert_eq!(res.status, 404);
        assert_eq!(res.body["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn list_filters_by_search_difficulty_and_tag() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        app.create_problem(&token, "Two Sum").await;
        let mut hard = problem_payload();
        hard["title"] = json!("Graph Paths");
        hard["difficulty"] = json!("HARD");
        hard["tags"] = json!(["graphs"]);
        let res = app.post_with_token(routes::PROBLEMS, &hard, &token).await;
        assert_eq!(res.status, 201, "{}", res.text);

        let all = app.get_with_token(routes::PROBLEMS, &token).await;
        assert_eq!(all.status, 200);
        assert_eq!(all.body["pagination"]["total"], 2);
        assert!(all.body["data"][0].get("testcases").is_none());

        let search = app
            .get_with_token(&format!("{}?search=two", routes::PROBLEMS), &token)
            .await;
        assert_eq!(search.body["pagination"]["total"], 1);
        assert_eq!(search.body["data"][0]["title"], "Two Sum");

        let by_difficulty = app
            .get_with_token(&format!("{}?difficulty=HARD", routes::PROBLEMS), &token)
            .await;
        assert_eq!(by_difficulty.body["pagination"]["total"], 1);
        assert_eq!(by_difficulty.body["data"][0]["title"], "Graph Paths");

        let by_tag = app
            .get_with_token(&format!("{}?tag=math", routes::PROBLEMS), &token)
            .await;
        assert_eq!(by_tag.body["pagination"]["total"], 1);
        assert_eq!(by_tag.body["data"][0]["tags"], json!(["math", "implementation"]));
    }

    #[tokio::test]
    async fn list_paginates() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        for i in 0..3 {
            app.create_problem(&token, &format!("Problem {i}")).await;
        }

        let res = app
            .get_with_token(&format!("{}?page=2&per_page=2", routes::PROBLEMS), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body["data"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["pagination"]["total_pages"], 2);
    }
}

mod update {
    use super::*;

    #[tokio::test]
    async fn metadata_change_skips_the_judge() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Original").await;
        let before = app.get_with_token(&routes::problem(id), &token).await;
        let calls = app.judge.submit_calls();

        let res = app
            .patch_with_token(&routes::problem(id), &json!({"title": "Renamed"}), &token)
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["title"], "Renamed");
        assert_eq!(res.body["validated_at"], before.body["validated_at"]);
        assert_eq!(app.judge.submit_calls(), calls);
    }

    #[tokio::test]
    async fn resubmitting_identical_testcases_skips_the_judge() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Same").await;
        let calls = app.judge.submit_calls();

        let res = app
            .patch_with_token(
                &routes::problem(id),
                &json!({"testcases": problem_payload()["testcases"]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(app.judge.submit_calls(), calls);
    }

    #[tokio::test]
    async fn new_testcases_are_validated_against_stored_solutions() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Grows").await;
        let calls = app.judge.submit_calls();

        let res = app
            .patch_with_token(
                &routes::problem(id),
                &json!({"testcases": [{"input": "10 20", "output": "30"}]}),
                &token,
            )
            .await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["testcases"].as_array().unwrap().len(), 1);
        assert_eq!(res.body["testcases"][0]["index"], 1);
        assert!(app.judge.submit_calls() > calls);

        let submitted: Vec<String> = app
            .judge
            .submitted_batches()
            .into_iter()
            .skip(calls)
            .flatten()
            .map(|r| r.stdin)
            .collect();
        assert_eq!(submitted, vec!["10 20", "10 20"]);
    }

    #[tokio::test]
    async fn failing_new_solution_leaves_the_problem_untouched() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Stable").await;
        let before = app.get_with_token(&routes::problem(id), &token).await;

        let res = app
            .patch_with_token(
                &routes::problem(id),
                &json!({
                    "title": "Should Not Apply",
                    "reference_solutions": {"JAVA": format!("class Main {{ /* {WRONG_MARKER} */ }}")}
                }),
                &token,
            )
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.body["code"], "TESTCASE_FAILED");
        assert_eq!(res.body["details"]["language"], "JAVA");

        let after = app.get_with_token(&routes::problem(id), &token).await;
        assert_eq!(after.body, before.body);
    }

    #[tokio::test]
    async fn empty_patch_returns_the_stored_problem() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Untouched").await;
        let before = app.get_with_token(&routes::problem(id), &token).await;

        let res = app
            .patch_with_token(&routes::problem(id), &json!({}), &token)
            .await;

        assert_eq!(res.status, 200);
        assert_eq!(res.body, before.body);
    }

    #[tokio::test]
    async fn store_refuses_writes_judged_against_a_stale_pair() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Raced").await;
        let store = SeaOrmProblemStore::new(app.db.clone());
        let current = store.find(id).await.unwrap().unwrap();

        let testcases = vec![Testcase::new("10 20", "30")];
        let patch = ProblemPatch {
            testcases: Some(testcases.clone()),
            ..Default::default()
        };

        let stale = ValidatedSet {
            testcases: testcases.clone(),
            reference_solutions: [("PYTHON", "print(0)")].into_iter().collect(),
        };
        let outcome = store.update(id, &patch, Some(&stale)).await.unwrap();
        assert!(matches!(outcome, UpdateOutcome::Stale), "{outcome:?}");
        assert_eq!(store.find(id).await.unwrap().unwrap(), current);

        let fresh = ValidatedSet {
            testcases,
            reference_solutions: current.draft.reference_solutions.clone(),
        };
        match store.update(id, &patch, Some(&fresh)).await.unwrap() {
            UpdateOutcome::Updated(record) => {
                assert_eq!(record.draft.testcases.len(), 1);
                assert!(record.validated_at > current.validated_at);
            }
            other => panic!("expected Updated, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn patching_a_missing_problem_is_not_found() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;

        let res = app
            .patch_with_token(&routes::problem(4242), &json!({"title": "x"}), &token)
            .await;

        assert_eq!(res.status, 404);
    }
}

mod delete {
    use super::*;

    #[tokio::test]
    async fn admin_deletes_problem_and_it_is_gone() {
        let app = TestApp::spawn().await;
        let token = app.create_admin().await;
        let id = app.create_problem(&token, "Doomed").await;

        let res = app.delete_with_token(&routes::problem(id), &token).await;
        assert_eq!(res.status, 204);

        let res = app.get_with_token(&routes::problem(id), &token).await;
        assert_eq!(res.status, 404);

        let res = app.delete_with_token(&routes::problem(id), &token).await;
        assert_eq!(res.status, 404);
    }

    #[tokio::test]
    async fn regular_user_cannot_delete() {
        let app = TestApp::spawn().await;
        let admin = app.create_admin().await;
        let id = app.create_problem(&admin, "Protected").await;
        let user = app
            .create_authenticated_user("user@example.com", "userpass1")
            .await;

        let res = app.delete_with_token(&routes::problem(id), &user).await;

        assert_eq!(res.status, 403);
    }
}
