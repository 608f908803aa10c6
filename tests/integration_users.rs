mod common;

use axum::http::StatusCode;
use serde_json::json;
use sqlx::PgPool;

use common::{
    classroom_of, create_test_user, empty_request, generate_unique_email, id_of, json_request,
    principal_token, roster_of, send, setup_test_app, token_for,
};
use rollcall_auth::Role;

#[sqlx::test(migrations = "./migrations")]
async fn test_create_user_success(pool: PgPool) {
    let app = setup_test_app(pool);
    let email = generate_unique_email();

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/user/create-user",
            None,
            json!({
                "name": "Ada Lovelace",
                "email": email.to_uppercase(),
                "password": "analytical",
                "role": "Student"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "creating user successful");
    assert_eq!(body["newUser"]["email"], email);
    assert_eq!(body["newUser"]["role"], "Student");
    assert!(body["newUser"]["classroomId"].is_null());
    assert!(body["newUser"].get("password").is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_user_duplicate_email(pool: PgPool) {
    let existing = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/user/create-user",
            None,
            json!({
                "name": "Someone Else",
                "email": existing.email,
                "password": "password",
                "role": "Teacher"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "User already exists, you can login");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_create_user_rejects_unknown_role(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/user/create-user",
            None,
            json!({
                "name": "Ada Lovelace",
                "email": generate_unique_email(),
                "password": "password",
                "role": "Principal"
            }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Principal is not an accepted value");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_user_partial_fields(pool: PgPool) {
    let user = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/user/update-user/{}", user.id),
            None,
            json!({ "name": "Ada King" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["updatedUser"]["name"], "Ada King");
    assert_eq!(body["updatedUser"]["email"], user.email);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_user_empty_body(pool: PgPool) {
    let user = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        json_request("PUT", &format!("/user/update-user/{}", user.id), None, json!({})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No data provided to update");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_user_email_taken(pool: PgPool) {
    let first = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let second = create_test_user(&pool, "Alan Turing", "Student").await;
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            &format!("/user/update-user/{}", second.id),
            None,
            json!({ "email": first.email }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Email is already in use");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_update_unknown_user(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/user/update-user/{}", uuid::Uuid::new_v4()),
            None,
            json!({ "name": "Nobody Here" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_role_change_refused_while_in_classroom(pool: PgPool) {
    let student = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let app = setup_test_app(pool);
    let token = principal_token();

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/classroom/create-classroom",
            Some(&token),
            json!({ "name": "1A", "students": [student.id] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            &format!("/user/update-user/{}", student.id),
            None,
            json!({ "role": "Teacher" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_user_requires_principal(pool: PgPool) {
    let user = create_test_user(&pool, "Ada Lovelace", "Teacher").await;
    let app = setup_test_app(pool);

    let (status, _) = send(
        &app,
        empty_request("DELETE", &format!("/user/delete-user/{}", user.id), None),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let teacher_token = token_for(user.id, &user.email, Role::Teacher);
    let (status, body) = send(
        &app,
        empty_request(
            "DELETE",
            &format!("/user/delete-user/{}", user.id),
            Some(&teacher_token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["message"], "Insufficient permissions");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_student_leaves_roster(pool: PgPool) {
    let leaving = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let staying = create_test_user(&pool, "Alan Turing", "Student").await;
    let app = setup_test_app(pool.clone());
    let token = principal_token();

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/classroom/create-classroom",
            Some(&token),
            json!({ "name": "1A", "students": [leaving.id, staying.id] }),
        ),
    )
    .await;
    let classroom_id = id_of(&body["classroom"]["id"]);

    let (status, body) = send(
        &app,
        empty_request(
            "DELETE",
            &format!("/user/delete-user/{}", leaving.id),
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "User deleted successfully");
    assert_eq!(roster_of(&pool, classroom_id).await, vec![staying.id]);
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_teacher_clears_slot(pool: PgPool) {
    let teacher = create_test_user(&pool, "Grace Hopper", "Teacher").await;
    let app = setup_test_app(pool.clone());
    let token = principal_token();

    let (_, body) = send(
        &app,
        json_request(
            "POST",
            "/classroom/create-classroom",
            Some(&token),
            json!({ "name": "1A", "teacher": teacher.id }),
        ),
    )
    .await;
    let classroom_id = id_of(&body["classroom"]["id"]);

    let (status, _) = send(
        &app,
        empty_request(
            "DELETE",
            &format!("/user/delete-user/{}", teacher.id),
            Some(&token),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let teacher_id: Option<uuid::Uuid> =
        sqlx::query_scalar("SELECT teacher_id FROM classrooms WHERE id = $1")
            .bind(classroom_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(teacher_id.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_delete_unknown_user(pool: PgPool) {
    let app = setup_test_app(pool);

    let (status, body) = send(
        &app,
        empty_request(
            "DELETE",
            &format!("/user/delete-user/{}", uuid::Uuid::new_v4()),
            Some(&principal_token()),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "User not found");
}

#[sqlx::test(migrations = "./migrations")]
async fn test_available_listings_exclude_assigned(pool: PgPool) {
    let assigned_teacher = create_test_user(&pool, "Grace Hopper", "Teacher").await;
    let free_teacher = create_test_user(&pool, "Barbara Liskov", "Teacher").await;
    let assigned_student = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let free_student = create_test_user(&pool, "Alan Turing", "Student").await;
    let app = setup_test_app(pool.clone());

    send(
        &app,
        json_request(
            "POST",
            "/classroom/create-classroom",
            Some(&principal_token()),
            json!({
                "name": "1A",
                "teacher": assigned_teacher.id,
                "students": [assigned_student.id]
            }),
        ),
    )
    .await;

    let ids = |body: &serde_json::Value| -> Vec<uuid::Uuid> {
        body.as_array().unwrap().iter().map(|u| id_of(&u["id"])).collect()
    };

    let (_, body) = send(&app, empty_request("GET", "/user/available-teachers", None)).await;
    assert_eq!(ids(&body), vec![free_teacher.id]);

    let (_, body) = send(&app, empty_request("GET", "/user/available-students", None)).await;
    assert_eq!(ids(&body), vec![free_student.id]);

    let (_, body) = send(&app, empty_request("GET", "/user/get-students", None)).await;
    let students = body.as_array().unwrap();
    assert_eq!(students.len(), 2);
    let assigned = students
        .iter()
        .find(|s| id_of(&s["id"]) == assigned_student.id)
        .unwrap();
    assert_eq!(assigned["classroom"]["name"], "1A");

    assert!(classroom_of(&pool, free_student.id).await.is_none());
}

#[sqlx::test(migrations = "./migrations")]
async fn test_profile_for_signed_in_user(pool: PgPool) {
    let user = create_test_user(&pool, "Ada Lovelace", "Student").await;
    let app = setup_test_app(pool);

    let token = token_for(user.id, &user.email, Role::Student);
    let (status, body) = send(&app, empty_request("GET", "/user/profile", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], user.email);

    let (status, _) = send(
        &app,
        empty_request("GET", "/user/profile", Some(&principal_token())),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}
