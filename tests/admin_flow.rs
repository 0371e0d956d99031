use ngo_admin::{
    config::AuthConfig,
    db::{create_orm_conn, run_migrations},
    dto::{
        auth::LoginRequest,
        notifications::CreateNotificationRequest,
        settings::{CreateSettingRequest, SaveSettingRequest},
        users::{CreateUserRequest, UpdateUserRequest},
    },
    entity::{
        audit_logs, login_history, system_settings,
        users::ActiveModel as UserActive,
        AdminNotifications, AuditLogs, LoginHistory, SystemSettings, Users,
    },
    error::AppError,
    middleware::{auth::AuthUser, client::ClientInfo},
    models::{Priority, Role},
    routes::params::{AuditLogQuery, Pagination, UserListQuery, UserSearchQuery},
    services::{
        audit_service, auth_service, dashboard_service, notification_service, settings_service,
        user_service,
    },
    state::AppState,
};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter,
    Set, Statement,
};
use uuid::Uuid;

// Each flow needs a live Postgres; they skip when none is configured and run
// serially against the same schema.
static DB_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

fn database_url() -> Option<String> {
    match std::env::var("TEST_DATABASE_URL").or_else(|_| std::env::var("DATABASE_URL")) {
        Ok(url) => Some(url),
        Err(_) => {
            eprintln!(
                "Skipping test: set TEST_DATABASE_URL or DATABASE_URL to run integration flow tests."
            );
            None
        }
    }
}

// Admin flow: create users, filter them, guard self-service actions, settings
// upsert, notifications and the audit trail they leave behind.
#[tokio::test]
async fn admin_manages_users_settings_and_notifications() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = DB_LOCK.lock().await;
    let state = setup_state(&database_url).await?;
    let client = ClientInfo::internal();

    let admin_id = insert_user(&state, "admin@example.org", "adminpass123", Role::Admin).await?;
    let admin = AuthUser {
        user_id: admin_id,
        email: "admin@example.org".into(),
        role: Role::Admin,
    };

    // Create a volunteer through the service; the email is normalized.
    let created = user_service::create_user(
        &state,
        &admin,
        CreateUserRequest {
            email: "  Vera@Example.org ".into(),
            first_name: "Vera".into(),
            last_name: "Volunteer".into(),
            role: Role::Volunteer,
            phone_number: Some("+15551234567".into()),
            department: "Outreach".into(),
            password: "volunteer123".into(),
            password_confirm: "volunteer123".into(),
        },
        &client,
    )
    .await?;
    let volunteer = created.data.unwrap();
    assert_eq!(volunteer.email, "vera@example.org");
    assert_eq!(volunteer.full_name, "Vera Volunteer");

    let duplicate = user_service::create_user(
        &state,
        &admin,
        CreateUserRequest {
            email: "vera@example.org".into(),
            first_name: "Other".into(),
            last_name: "Person".into(),
            role: Role::Campaign,
            phone_number: None,
            department: String::new(),
            password: "password123".into(),
            password_confirm: "password123".into(),
        },
        &client,
    )
    .await;
    assert!(matches!(duplicate, Err(AppError::Conflict(_))));

    // Role filter and search.
    let volunteers = user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            role: Some(Role::Volunteer),
            ..Default::default()
        },
    )
    .await?;
    let volunteers = volunteers.data.unwrap();
    assert_eq!(volunteers.items.len(), 1);
    assert_eq!(volunteers.selected_role, Some(Role::Volunteer));

    let by_department = user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            search: Some("outreach".into()),
            ..Default::default()
        },
    )
    .await?;
    assert_eq!(by_department.data.unwrap().items[0].id, volunteer.id);

    let search = user_service::search_users(
        &state,
        &admin,
        UserSearchQuery {
            q: Some("vera".into()),
        },
    )
    .await?;
    assert_eq!(search.data.unwrap().results.len(), 1);

    // Wildcards in the term are matched literally.
    let percent = user_service::search_users(
        &state,
        &admin,
        UserSearchQuery {
            q: Some("%".into()),
        },
    )
    .await?;
    assert!(percent.data.unwrap().results.is_empty());
    let underscore = user_service::list_users(
        &state,
        &admin,
        UserListQuery {
            search: Some("_".into()),
            ..Default::default()
        },
    )
    .await?;
    assert!(underscore.data.unwrap().items.is_empty());

    // Edits are trimmed before saving; the audit row keeps old/new pairs.
    let edited = user_service::update_user(
        &state,
        &admin,
        volunteer.id,
        UpdateUserRequest {
            email: Some(" VERA@example.org".into()),
            first_name: Some("  Veronica ".into()),
            phone_number: Some(String::new()),
            department: Some(" Outreach ".into()),
            ..Default::default()
        },
        &client,
    )
    .await?
    .data
    .unwrap();
    assert_eq!(edited.first_name, "Veronica");
    assert_eq!(edited.department, "Outreach");
    assert_eq!(edited.phone_number, None);
    assert_eq!(edited.email, "vera@example.org");

    let update_row = AuditLogs::find()
        .filter(audit_logs::Column::Action.eq("update"))
        .filter(audit_logs::Column::ModelName.eq("User"))
        .filter(audit_logs::Column::ObjectId.eq(volunteer.id.to_string()))
        .one(&state.orm)
        .await?
        .expect("update audited");
    let changes = update_row.changes.expect("changes recorded");
    assert_eq!(
        changes["first_name"],
        serde_json::json!({ "old": "Vera", "new": "Veronica" })
    );
    assert_eq!(changes["phone_number"]["old"], "+15551234567");
    assert!(changes["phone_number"]["new"].is_null());
    assert!(changes.get("email").is_none());
    assert!(changes.get("department").is_none());

    // Self-service guards.
    let self_toggle = user_service::toggle_user_status(&state, &admin, admin_id, &client).await;
    assert!(matches!(self_toggle, Err(AppError::BadRequest(_))));
    let self_delete = user_service::delete_user(&state, &admin, admin_id, &client).await;
    assert!(matches!(self_delete, Err(AppError::BadRequest(_))));
    let self_demote = user_service::update_user(
        &state,
        &admin,
        admin_id,
        UpdateUserRequest {
            role: Some(Role::Volunteer),
            ..Default::default()
        },
        &client,
    )
    .await;
    assert!(matches!(self_demote, Err(AppError::BadRequest(_))));

    // A volunteer is kept out of admin endpoints.
    let volunteer_auth = AuthUser {
        user_id: volunteer.id,
        email: volunteer.email.clone(),
        role: Role::Volunteer,
    };
    let forbidden = user_service::list_users(&state, &volunteer_auth, UserListQuery::default()).await;
    assert!(matches!(forbidden, Err(AppError::Forbidden(_))));
    let wrong_dashboard =
        dashboard_service::role_dashboard(&state, &volunteer_auth, Role::Campaign).await;
    assert!(matches!(wrong_dashboard, Err(AppError::Forbidden(_))));
    let own_dashboard =
        dashboard_service::role_dashboard(&state, &volunteer_auth, Role::Volunteer).await?;
    assert_eq!(own_dashboard.data.unwrap().role_display, "Volunteer");

    // Settings: create, reject duplicate key, upsert.
    settings_service::create_setting(
        &state,
        &admin,
        CreateSettingRequest {
            key: "site_name".into(),
            value: "Helping Hands".into(),
            description: String::new(),
        },
        &client,
    )
    .await?;
    let dup_key = settings_service::create_setting(
        &state,
        &admin,
        CreateSettingRequest {
            key: "site_name".into(),
            value: "Other".into(),
            description: String::new(),
        },
        &client,
    )
    .await;
    assert!(matches!(dup_key, Err(AppError::Conflict(_))));

    let saved = settings_service::save_setting(
        &state,
        &admin,
        "site_name",
        SaveSettingRequest {
            value: "Helping Hands NGO".into(),
            description: "Shown in titles".into(),
        },
        &client,
    )
    .await?;
    assert_eq!(saved.data.unwrap().value, "Helping Hands NGO");
    assert_eq!(
        SystemSettings::find()
            .filter(system_settings::Column::Key.eq("site_name"))
            .count(&state.orm)
            .await?,
        1
    );

    // Notifications: only the recipient can toggle read state.
    let sent = notification_service::create_notification(
        &state,
        &admin,
        CreateNotificationRequest {
            recipient_id: volunteer.id,
            title: "Welcome".into(),
            message: "Glad to have you".into(),
            priority: Priority::High,
        },
        &client,
    )
    .await?;
    let notification = sent.data.unwrap();
    assert_eq!(notification.badge, "bg-warning");

    let inbox = notification_service::list_notifications(
        &state,
        &volunteer_auth,
        Pagination::default(),
    )
    .await?;
    assert_eq!(inbox.data.unwrap().unread_count, 1);

    let not_mine = notification_service::set_read(&state, &admin, notification.id, true).await;
    assert!(matches!(not_mine, Err(AppError::NotFound)));

    let read = notification_service::set_read(&state, &volunteer_auth, notification.id, true)
        .await?
        .data
        .unwrap();
    assert!(read.is_read);
    assert!(read.read_at.is_some());
    let unread = notification_service::set_read(&state, &volunteer_auth, notification.id, false)
        .await?
        .data
        .unwrap();
    assert!(!unread.is_read);
    assert!(unread.read_at.is_none());

    // Audit trail filters.
    let creates = audit_service::list_audit_logs(
        &state,
        &admin,
        AuditLogQuery {
            user_id: Some(admin_id),
            action: Some("create".into()),
            ..Default::default()
        },
    )
    .await?;
    let creates = creates.data.unwrap();
    assert!(creates.items.len() >= 3);
    assert!(creates.items.iter().all(|e| e.action == "create"));
    assert_eq!(creates.action_choices.len(), 8);

    let bad_action = audit_service::list_audit_logs(
        &state,
        &admin,
        AuditLogQuery {
            action: Some("explode".into()),
            ..Default::default()
        },
    )
    .await;
    assert!(matches!(bad_action, Err(AppError::BadRequest(_))));

    let dashboard = dashboard_service::admin_dashboard(&state, &admin).await?;
    let dashboard = dashboard.data.unwrap();
    assert_eq!(dashboard.total_users, 2);
    assert_eq!(dashboard.volunteer_count, 1);
    assert_eq!(dashboard.admin_count, 1);

    Ok(())
}

// Deleting a user cascades their notifications and login history but keeps
// audit rows and settings with the reference cleared.
#[tokio::test]
async fn deleting_a_user_keeps_audit_trail() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = DB_LOCK.lock().await;
    let state = setup_state(&database_url).await?;
    let client = ClientInfo::internal();

    let admin_id = insert_user(&state, "root@example.org", "rootpass123", Role::Admin).await?;
    let admin = AuthUser {
        user_id: admin_id,
        email: "root@example.org".into(),
        role: Role::Admin,
    };
    let other_admin_id =
        insert_user(&state, "deputy@example.org", "deputypass123", Role::Admin).await?;
    let deputy = AuthUser {
        user_id: other_admin_id,
        email: "deputy@example.org".into(),
        role: Role::Admin,
    };

    settings_service::save_setting(
        &state,
        &deputy,
        "contact_email",
        SaveSettingRequest {
            value: "info@example.org".into(),
            description: String::new(),
        },
        &client,
    )
    .await?;
    notification_service::create_notification(
        &state,
        &admin,
        CreateNotificationRequest {
            recipient_id: other_admin_id,
            title: "Heads up".into(),
            message: "Board meeting".into(),
            priority: Priority::default(),
        },
        &client,
    )
    .await?;

    user_service::delete_user(&state, &admin, other_admin_id, &client).await?;

    assert_eq!(AdminNotifications::find().count(&state.orm).await?, 0);
    let setting = SystemSettings::find()
        .filter(system_settings::Column::Key.eq("contact_email"))
        .one(&state.orm)
        .await?
        .expect("setting survives");
    assert_eq!(setting.updated_by, None);

    let deputy_rows = AuditLogs::find()
        .filter(audit_logs::Column::UserId.eq(other_admin_id))
        .count(&state.orm)
        .await?;
    assert_eq!(deputy_rows, 0);
    let orphaned = AuditLogs::find()
        .filter(audit_logs::Column::UserId.is_null())
        .count(&state.orm)
        .await?;
    assert!(orphaned >= 1);

    Ok(())
}

// Five wrong passwords lock the account even for the right password.
#[tokio::test]
async fn repeated_failures_lock_the_account() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = DB_LOCK.lock().await;
    let state = setup_state(&database_url).await?;
    let client = ClientInfo::internal();

    insert_user(&state, "donor@example.org", "donationpass1", Role::Donation).await?;

    let ok = auth_service::login_user(
        &state,
        LoginRequest {
            email: "  DONOR@example.org ".into(),
            password: "donationpass1".into(),
        },
        &client,
    )
    .await?;
    let login = ok.data.unwrap();
    assert!(login.token.starts_with("Bearer "));
    assert_eq!(login.dashboard_url, Role::Donation.dashboard_url());

    // A single failure is forgotten after the next good login.
    let failed = auth_service::login_user(
        &state,
        LoginRequest {
            email: "donor@example.org".into(),
            password: "wrong-password".into(),
        },
        &client,
    )
    .await;
    assert!(matches!(failed, Err(AppError::BadRequest(_))));
    assert_eq!(failed_attempts(&state, login.user.id).await?, 1);

    auth_service::login_user(
        &state,
        LoginRequest {
            email: "donor@example.org".into(),
            password: "donationpass1".into(),
        },
        &client,
    )
    .await?;
    assert_eq!(failed_attempts(&state, login.user.id).await?, 0);

    for _ in 0..auth_service::MAX_FAILED_ATTEMPTS {
        let attempt = auth_service::login_user(
            &state,
            LoginRequest {
                email: "donor@example.org".into(),
                password: "wrong-password".into(),
            },
            &client,
        )
        .await;
        assert!(matches!(attempt, Err(AppError::BadRequest(_))));
    }

    let locked = auth_service::login_user(
        &state,
        LoginRequest {
            email: "donor@example.org".into(),
            password: "donationpass1".into(),
        },
        &client,
    )
    .await;
    assert!(matches!(locked, Err(AppError::Forbidden(_))));

    Ok(())
}

// Logout closes the session row, live stats and analytics see the new user,
// saving an unknown setting creates it, and deletion removes login history.
#[tokio::test]
async fn sessions_stats_and_analytics() -> anyhow::Result<()> {
    let Some(database_url) = database_url() else {
        return Ok(());
    };
    let _guard = DB_LOCK.lock().await;
    let state = setup_state(&database_url).await?;
    let client = ClientInfo::internal();

    let admin_id = insert_user(&state, "chief@example.org", "chiefpass123", Role::Admin).await?;
    let admin = AuthUser {
        user_id: admin_id,
        email: "chief@example.org".into(),
        role: Role::Admin,
    };

    let campaigner = user_service::create_user(
        &state,
        &admin,
        CreateUserRequest {
            email: "cam@example.org".into(),
            first_name: "Cam".into(),
            last_name: "Paign".into(),
            role: Role::Campaign,
            phone_number: None,
            department: "Outreach".into(),
            password: "campaign123".into(),
            password_confirm: "campaign123".into(),
        },
        &client,
    )
    .await?
    .data
    .unwrap();

    auth_service::login_user(
        &state,
        LoginRequest {
            email: "cam@example.org".into(),
            password: "campaign123".into(),
        },
        &client,
    )
    .await?;
    let cam = AuthUser {
        user_id: campaigner.id,
        email: campaigner.email.clone(),
        role: Role::Campaign,
    };
    auth_service::logout_user(&state, &cam, &client).await?;

    let sessions = LoginHistory::find()
        .filter(login_history::Column::UserId.eq(campaigner.id))
        .all(&state.orm)
        .await?;
    assert_eq!(sessions.len(), 1);
    assert!(sessions[0].login_successful);
    assert!(sessions[0].logout_time.is_some());

    let stats = dashboard_service::dashboard_stats(&state, &admin)
        .await?
        .data
        .unwrap();
    assert_eq!(stats.total_users, 2);
    assert_eq!(stats.active_users, 2);
    assert_eq!(stats.online_users, 1);
    assert!(stats.recent_activities >= 3);

    let analytics = dashboard_service::user_analytics(&state, &admin)
        .await?
        .data
        .unwrap();
    let registered: i64 = analytics.registration_trend.iter().map(|d| d.count).sum();
    assert_eq!(registered, 2);
    assert_eq!(analytics.active_by_role.len(), 4);
    let active_campaigners = analytics
        .active_by_role
        .iter()
        .find(|c| c.role == Role::Campaign)
        .map(|c| c.count);
    assert_eq!(active_campaigners, Some(1));
    assert_eq!(analytics.department_stats.len(), 1);
    assert_eq!(analytics.department_stats[0].department, "Outreach");
    assert_eq!(analytics.department_stats[0].count, 1);

    let created = settings_service::save_setting(
        &state,
        &admin,
        "maintenance_mode",
        SaveSettingRequest {
            value: "false".into(),
            description: String::new(),
        },
        &client,
    )
    .await?
    .data
    .unwrap();
    assert_eq!(created.key, "maintenance_mode");
    let create_rows = AuditLogs::find()
        .filter(audit_logs::Column::ModelName.eq("SystemSettings"))
        .filter(audit_logs::Column::ObjectRepr.eq("maintenance_mode"))
        .all(&state.orm)
        .await?;
    assert_eq!(create_rows.len(), 1);
    assert_eq!(create_rows[0].action, "create");

    user_service::delete_user(&state, &admin, campaigner.id, &client).await?;
    let leftover = LoginHistory::find()
        .filter(login_history::Column::UserId.eq(campaigner.id))
        .count(&state.orm)
        .await?;
    assert_eq!(leftover, 0);

    Ok(())
}

async fn failed_attempts(state: &AppState, id: Uuid) -> anyhow::Result<i32> {
    let user = Users::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| anyhow::anyhow!("user {id} missing"))?;
    Ok(user.failed_login_attempts)
}

async fn setup_state(database_url: &str) -> anyhow::Result<AppState> {
    let orm = create_orm_conn(database_url).await?;
    run_migrations(&orm).await?;

    // Clean tables between runs
    let backend = orm.get_database_backend();
    orm.execute(Statement::from_string(
        backend,
        "TRUNCATE TABLE audit_logs, admin_notifications, system_settings, login_history, users CASCADE",
    ))
    .await?;

    Ok(AppState::new(
        orm,
        AuthConfig {
            jwt_secret: "integration-secret".into(),
            token_ttl_hours: 1,
        },
    ))
}

async fn insert_user(
    state: &AppState,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    let user = UserActive {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(auth_service::hash_password(password)?),
        first_name: Set("Test".into()),
        last_name: Set(role.display_name().into()),
        role: Set(role.as_str().into()),
        phone_number: Set(None),
        department: Set(String::new()),
        is_active: Set(true),
        email_verified: Set(true),
        failed_login_attempts: Set(0),
        account_locked_until: Set(None),
        last_login: Set(None),
        last_login_ip: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    Ok(user.id)
}
