mod helpers;

use helpers::*;
use usergroups::forms::GroupForm;
use usergroups::routes::Route;
use usergroups::store::GroupStore;
use usergroups::views::{ViewRequest, ViewResponse};

fn template_name(response: &ViewResponse) -> &str {
    match response {
        ViewResponse::Render(template) => &template.name,
        other => panic!("expected a template, got {:?}", other),
    }
}

#[tokio::test]
async fn test_mutating_views_confirm_on_get() {
    let ctx = TestContext::new().await;
    let views = ctx.views();
    let group = ctx.create_group(&ctx.alice, "Readers").await;
    let alice = Some(ctx.alice.id);

    let response = views
        .add_admin(ViewRequest::get(alice), group.id, ctx.bob.id)
        .await
        .unwrap();

    let ViewResponse::Render(template) = &response else {
        panic!("expected confirmation, got {:?}", response);
    };
    assert_eq!(template.name, "usergroups/confirm_action.html");
    assert_eq!(template.context["action"], "add_admin");
    assert_eq!(template.context["member"]["username"], "bob");
    assert_eq!(template.context["group"]["name"], "Readers");

    // Nothing happened yet
    assert!(!ctx.member_ids(group.id).await.contains(&ctx.bob.id));

    let response = views
        .delete_group(ViewRequest::get(alice), group.id)
        .await
        .unwrap();
    assert_eq!(template_name(&response), "usergroups/confirm_action.html");
    assert!(views.service().group(group.id).await.is_ok());
}

#[tokio::test]
async fn test_add_admin_post_redirects_to_detail() {
    let ctx = TestContext::new().await;
    let group = ctx.create_group(&ctx.alice, "Readers").await;

    let response = ctx
        .views()
        .add_admin(ViewRequest::post(Some(ctx.alice.id)), group.id, ctx.bob.id)
        .await
        .unwrap();

    assert_eq!(
        response,
        ViewResponse::Redirect(Route::GroupDetail { group_id: group.id })
    );
    assert!(ctx.admin_ids(group.id).await.contains(&ctx.bob.id));
}

#[tokio::test]
async fn test_remove_self_redirects_to_leave() {
    let ctx = TestContext::new().await;
    let group = ctx.create_group(&ctx.alice, "Readers").await;

    let response = ctx
        .views()
        .remove_member(ViewRequest::post(Some(ctx.alice.id)), group.id, ctx.alice.id)
        .await
        .unwrap();

    assert_eq!(
        response,
        ViewResponse::Redirect(Route::LeaveGroup { group_id: group.id })
    );
    assert_eq!(ctx.member_ids(group.id).await, vec![ctx.alice.id]);
}

#[tokio::test]
async fn test_remove_member_ajax_json() {
    let ctx = TestContext::new().await;
    let group = ctx.create_group(&ctx.alice, "Readers").await;
    ctx.store.add_member(group.id, ctx.bob.id).await.unwrap();

    let response = ctx
        .views()
        .remove_member(
            ViewRequest::post(Some(ctx.alice.id)).ajax(),
            group.id,
            ctx.bob.id,
        )
        .await
        .unwrap();

    let ViewResponse::Json(body) = response else {
        panic!("expected JSON");
    };
    assert_eq!(body["message"], "Member removed from group");
    assert_eq!(body["user_id"], ctx.bob.id.to_string());
}

#[tokio::test]
async fn test_revoke_admin_ajax_json() {
    let ctx = TestContext::new().await;
    let views = ctx.views();
    let group = ctx.create_group(&ctx.alice, "Readers").await;
    views
        .service()
        .add_admin(ctx.alice.id, group.id, ctx.bob.id)
        .await
        .unwrap();

    let response = views
        .revoke_admin(
            ViewRequest::post(Some(ctx.alice.id)).ajax(),
            group.id,
            ctx.bob.id,
        )
        .await
        .unwrap();

    let ViewResponse::Json(body) = response else {
        panic!("expected JSON");
    };
    assert_eq!(body["message"], "Admin rights for user revoked");
    assert!(ctx.member_ids(group.id).await.contains(&ctx.bob.id));
}

#[tokio::test]
async fn test_sole_admin_leave_redirects_to_delete() {
    let ctx = TestContext::new().await;
    let group = ctx.create_group(&ctx.alice, "Readers").await;

    let response = ctx
        .views()
        .leave_group(ViewRequest::post(Some(ctx.alice.id)), group.id)
        .await
        .unwrap();

    assert_eq!(
        response,
        ViewResponse::Redirect(Route::DeleteGroup { group_id: group.id })
    );
    assert_eq!(ctx.member_ids(group.id).await, vec![ctx.alice.id]);
}

#[tokio::test]
async fn test_leave_ajax_json() {
    let ctx = TestContext::new().await;
    let group = ctx.create_group(&ctx.alice, "Readers").await;
    ctx.store.add_member(group.id, ctx.bob.id).await.unwrap();

    let response = ctx
        .views()
        .leave_group(ViewRequest::post(Some(ctx.bob.id)).ajax(), group.id)
        .await
        .unwrap();

    let ViewResponse::Json(body) = response else {
        panic!("expected JSON");
    };
    assert_eq!(body["message"], "You have left the group");
    assert_eq!(ctx.member_ids(group.id).await, vec![ctx.alice.id]);
}

#[tokio::test]
async fn test_apply_renders_application_page() {
    let ctx = TestContext::new().await;
    let views = ctx.views();
    let group = ctx.create_group(&ctx.alice, "Readers").await;

    let response = views
        .apply_to_join(ViewRequest::post(Some(ctx.bob.id)), group.id)
        .await
        .unwrap();
    let ViewResponse::Render(template) = response else {
        panic!("expected template");
    };
    assert_eq!(template.name, "usergroups/application.html");
    assert_eq!(template.context["already_member"], false);

    let response = views
        .apply_to_join(ViewRequest::post(Some(ctx.alice.id)).ajax(), group.id)
        .await
        .unwrap();
    let ViewResponse::Json(body) = response else {
        panic!("expected JSON");
    };
    assert_eq!(body["message"], "You're already a member of group");
    assert_eq!(body["already_member"], true);
}

#[tokio::test]
async fn test_approve_application_ajax_json() {
    let ctx = TestContext::new().await;
    let views = ctx.views();
    let group = ctx.create_group(&ctx.alice, "Readers").await;
    let application = views
        .service()
        .apply_to_join(ctx.bob.id, group.id)
        .await
        .unwrap()
        .application
        .unwrap();

    let response = views
        .approve_application(
            ViewRequest::post(Some(ctx.alice.id)).ajax(),
            group.id,
            application.id,
        )
        .await
        .unwrap();

    let ViewResponse::Json(body) = response else {
        panic!("expected JSON");
    };
    assert_eq!(body["message"], "Application approved");
    assert_eq!(body["application_id"], application.id.to_string());
    assert_eq!(body["user_id"], ctx.bob.id.to_string());
}

#[tokio::test]
async fn test_create_group_rerenders_invalid_form() {
    let ctx = TestContext::new().await;
    let form = GroupForm {
        name: "   ".to_string(),
        description: None,
    };

    let response = ctx
        .views()
        .create_group(ViewRequest::post(Some(ctx.alice.id)), Some(form))
        .await
        .unwrap();

    let ViewResponse::Render(template) = response else {
        panic!("expected the form again");
    };
    assert_eq!(template.name, "usergroups/group_form.html");
    assert_eq!(template.context["errors"]["name"][0], "This field is required.");
}

#[tokio::test]
async fn test_create_group_redirects_to_new_group() {
    let ctx = TestContext::new().await;
    let views = ctx.views();
    let form = GroupForm {
        name: "Readers".to_string(),
        description: None,
    };

    let response = views
        .create_group(ViewRequest::post(Some(ctx.alice.id)), Some(form))
        .await
        .unwrap();

    let groups = views.service().list_groups().await.unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(
        response,
        ViewResponse::Redirect(Route::GroupDetail {
            group_id: groups[0].id
        })
    );
}

#[tokio::test]
async fn test_anonymous_user_must_log_in() {
    let ctx = TestContext::new().await;
    let group = ctx.create_group(&ctx.alice, "Readers").await;

    let err = ctx
        .views()
        .apply_to_join(ViewRequest::post(None), group.id)
        .await
        .unwrap_err();

    assert_eq!(err.status_code(), 401);
}

#[tokio::test]
async fn test_email_invitation_views() {
    let ctx = TestContext::new().await;
    let views = ctx.views();
    let group = ctx.create_group(&ctx.alice, "Readers").await;
    ctx.store
        .create_email_invitation(group.id, ctx.alice.id, "bob@example.com", "secret")
        .await
        .unwrap();

    let response = views
        .validate_email_invitation(ViewRequest::get(Some(ctx.bob.id)), group.id, "secret")
        .await
        .unwrap();
    assert_eq!(
        response,
        ViewResponse::Redirect(Route::GroupJoined { group_id: group.id })
    );

    let response = views
        .validate_email_invitation(ViewRequest::get(Some(ctx.carol.id)), group.id, "secret")
        .await
        .unwrap();
    let ViewResponse::Render(template) = &response else {
        panic!("expected template, got {:?}", response);
    };
    assert_eq!(template.name, "usergroups/invalid_invitation.html");
    assert_eq!(template.context["reconciled"], false);
    assert!(!ctx.member_ids(group.id).await.contains(&ctx.carol.id));
}

#[tokio::test]
async fn test_duplicate_invitation_keys_are_flagged_as_reconciled() {
    let ctx = TestContext::new().await;
    let group = ctx.create_group(&ctx.alice, "Readers").await;
    for email in ["bob@example.com", "carol@example.com"] {
        ctx.store
            .create_email_invitation(group.id, ctx.alice.id, email, "shared")
            .await
            .unwrap();
    }

    let response = ctx
        .views()
        .validate_email_invitation(ViewRequest::get(Some(ctx.bob.id)), group.id, "shared")
        .await
        .unwrap();

    let ViewResponse::Render(template) = response else {
        panic!("expected template");
    };
    assert_eq!(template.name, "usergroups/invalid_invitation.html");
    assert_eq!(template.context["reconciled"], true);
    assert!(ctx.store.find_email_invitations(group.id, "shared").await.unwrap().is_empty());
    assert!(!ctx.member_ids(group.id).await.contains(&ctx.bob.id));
}

#[tokio::test]
async fn test_configured_template_names() {
    let templates = usergroups::options::Templates {
        list: "clubs/index.html".to_string(),
        ..Default::default()
    };
    let ctx = TestContext::with_config(
        usergroups::GroupConfiguration::new("clubs").with_templates(templates),
    )
    .await;

    let response = ctx.views().group_list(ViewRequest::get(None)).await.unwrap();

    assert_eq!(template_name(&response), "clubs/index.html");
}
