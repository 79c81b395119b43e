use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::incident::{NewIncident, TransitionUpdate};

use crate::entities::incidents::IncidentStatus;
use crate::entities::{audit_logs, departments, event_types, incidents, users};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        if !db_url.contains(":memory:") {
            let path_str = db_url.trim_start_matches("sqlite:");
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn attempt_repo(&self) -> repositories::attempt::AttemptRepository {
        repositories::attempt::AttemptRepository::new(self.conn.clone())
    }

    fn incident_repo(&self) -> repositories::incident::IncidentRepository {
        repositories::incident::IncidentRepository::new(self.conn.clone())
    }

    fn event_type_repo(&self) -> repositories::event_type::EventTypeRepository {
        repositories::event_type::EventTypeRepository::new(self.conn.clone())
    }

    fn department_repo(&self) -> repositories::department::DepartmentRepository {
        repositories::department::DepartmentRepository::new(self.conn.clone())
    }

    fn audit_repo(&self) -> repositories::audit::AuditRepository {
        repositories::audit::AuditRepository::new(self.conn.clone())
    }

    // Users

    pub async fn get_user_by_id(&self, id: i32) -> Result<Option<users::Model>> {
        self.user_repo().get_by_id(id).await
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<users::Model>> {
        self.user_repo().get_by_username(username).await
    }

    pub async fn list_users(&self) -> Result<Vec<users::Model>> {
        self.user_repo().list().await
    }

    pub async fn create_user(
        &self,
        username: &str,
        plaintext_password: &str,
        role_level: i32,
        email: Option<String>,
    ) -> Result<users::Model> {
        self.user_repo()
            .create(username, plaintext_password, role_level, email)
            .await
    }

    pub async fn update_user_password(&self, user_id: i32, new_password: &str) -> Result<()> {
        self.user_repo().update_password(user_id, new_password).await
    }

    pub async fn deactivate_user(&self, user_id: i32) -> Result<bool> {
        self.user_repo().deactivate(user_id).await
    }

    // Login attempts

    pub async fn record_login_attempt(
        &self,
        user_id: i32,
        success: bool,
        ip_address: &str,
    ) -> Result<()> {
        self.attempt_repo().record(user_id, success, ip_address).await
    }

    pub async fn failed_attempts_since(&self, user_id: i32, cutoff: &str) -> Result<u64> {
        self.attempt_repo().failed_count_since(user_id, cutoff).await
    }

    // Incidents

    pub async fn create_incident(&self, new: NewIncident) -> Result<incidents::Model> {
        self.incident_repo().create(new).await
    }

    pub async fn get_incident(&self, id: i32) -> Result<Option<incidents::Model>> {
        self.incident_repo().get(id).await
    }

    pub async fn get_incident_with_departments(
        &self,
        id: i32,
    ) -> Result<Option<(incidents::Model, Vec<departments::Model>)>> {
        self.incident_repo().get_with_departments(id).await
    }

    pub async fn list_incidents(&self) -> Result<Vec<incidents::Model>> {
        self.incident_repo().list().await
    }

    pub async fn apply_incident_transition(
        &self,
        id: i32,
        from: IncidentStatus,
        to: IncidentStatus,
        update: TransitionUpdate,
    ) -> Result<bool> {
        self.incident_repo().apply_transition(id, from, to, update).await
    }

    // Event types

    pub async fn create_event_type(
        &self,
        name: &str,
        description: Option<String>,
    ) -> Result<event_types::Model> {
        self.event_type_repo().create(name, description).await
    }

    pub async fn get_event_type_by_name(&self, name: &str) -> Result<Option<event_types::Model>> {
        self.event_type_repo().get_by_name(name).await
    }

    pub async fn event_type_exists(&self, id: i32) -> Result<bool> {
        self.event_type_repo().exists(id).await
    }

    pub async fn list_event_types(&self) -> Result<Vec<event_types::Model>> {
        self.event_type_repo().list().await
    }

    // Departments

    pub async fn create_department(&self, name: &str) -> Result<departments::Model> {
        self.department_repo().create(name).await
    }

    pub async fn get_department_by_name(&self, name: &str) -> Result<Option<departments::Model>> {
        self.department_repo().get_by_name(name).await
    }

    pub async fn department_exists(&self, id: i32) -> Result<bool> {
        self.department_repo().exists(id).await
    }

    pub async fn list_departments(&self) -> Result<Vec<departments::Model>> {
        self.department_repo().list().await
    }

    // Audit log

    pub async fn append_audit_log(
        &self,
        event_type: &str,
        level: &str,
        message: &str,
        details: Option<String>,
    ) -> Result<()> {
        self.audit_repo()
            .append(event_type, level, message, details)
            .await
    }

    pub async fn recent_audit_logs(&self, limit: u64) -> Result<Vec<audit_logs::Model>> {
        self.audit_repo().recent(limit).await
    }
}
