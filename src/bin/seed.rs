use ngo_admin::{
    db::{create_orm_conn, run_migrations},
    entity::{system_settings, users},
    models::Role,
    services::auth_service::hash_password,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::NotSet, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

const DEFAULT_SETTINGS: [(&str, &str, &str); 4] = [
    ("site_name", "NGO Management System", "Name shown in page titles"),
    ("max_login_attempts", "5", "Failed logins before the account locks"),
    ("lockout_minutes", "30", "How long a locked account stays locked"),
    ("maintenance_mode", "false", "Shown to clients as a maintenance banner flag"),
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let database_url = std::env::var("DATABASE_URL")?;

    let orm = create_orm_conn(&database_url).await?;
    // Ensure migrations are applied.
    run_migrations(&orm).await?;

    let admin_id = ensure_user(&orm, "admin@example.org", "admin12345", Role::Admin).await?;
    ensure_user(&orm, "campaign@example.org", "campaign12345", Role::Campaign).await?;
    ensure_user(&orm, "donation@example.org", "donation12345", Role::Donation).await?;
    ensure_user(&orm, "volunteer@example.org", "volunteer12345", Role::Volunteer).await?;
    seed_settings(&orm, admin_id).await?;

    println!("Seed completed. Admin ID: {admin_id}");
    Ok(())
}

async fn ensure_user(
    orm: &DatabaseConnection,
    email: &str,
    password: &str,
    role: Role,
) -> anyhow::Result<Uuid> {
    // If user already exists, keep it untouched
    if let Some(existing) = users::Entity::find()
        .filter(users::Column::Email.eq(email))
        .one(orm)
        .await?
    {
        println!("User {email} already present");
        return Ok(existing.id);
    }

    let password_hash = hash_password(password).map_err(|e| anyhow::anyhow!(e.to_string()))?;
    let (first_name, last_name) = match role {
        Role::Admin => ("System", "Administrator"),
        Role::Campaign => ("Campaign", "Manager"),
        Role::Donation => ("Donation", "Manager"),
        Role::Volunteer => ("Sample", "Volunteer"),
    };

    let created = users::ActiveModel {
        id: Set(Uuid::new_v4()),
        email: Set(email.to_string()),
        password_hash: Set(password_hash),
        first_name: Set(first_name.to_string()),
        last_name: Set(last_name.to_string()),
        role: Set(role.as_str().to_string()),
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
    .insert(orm)
    .await?;

    println!("Ensured user {email} (role={role})");
    Ok(created.id)
}

async fn seed_settings(orm: &DatabaseConnection, admin_id: Uuid) -> anyhow::Result<()> {
    for (key, value, description) in DEFAULT_SETTINGS {
        let exists = system_settings::Entity::find()
            .filter(system_settings::Column::Key.eq(key))
            .one(orm)
            .await?
            .is_some();
        if exists {
            continue;
        }
        system_settings::ActiveModel {
            id: Set(Uuid::new_v4()),
            key: Set(key.to_string()),
            value: Set(value.to_string()),
            description: Set(description.to_string()),
            is_active: Set(true),
            created_at: NotSet,
            updated_at: NotSet,
            updated_by: Set(Some(admin_id)),
        }
        .insert(orm)
        .await?;
    }

    println!("Seeded settings");
    Ok(())
}
