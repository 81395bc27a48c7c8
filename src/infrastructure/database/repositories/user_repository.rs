use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, Func, LikeExpr, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, Order, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set,
};
use tracing::error;

use crate::domain::{
    CreateUserDto, DomainError, DomainResult, GetUserDto, UpdateUserDto, User, UserColumn,
    UserFilter, UserRepositoryInterface, UserRole, UserStatus,
};
use crate::infrastructure::database::entities::user;
use crate::shared::{InfraError, Page, SortDirection};

pub struct UserRepository {
    db: DatabaseConnection,
}

impl UserRepository {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

// ── Conversion helpers ──────────────────────────────────────────

fn entity_role_to_domain(role: user::UserRole) -> UserRole {
    match role {
        user::UserRole::Manager => UserRole::Manager,
        user::UserRole::Cashier => UserRole::Cashier,
        user::UserRole::Admin => UserRole::Admin,
        user::UserRole::Superadmin => UserRole::Superadmin,
    }
}

fn domain_role_to_entity(role: UserRole) -> user::UserRole {
    match role {
        UserRole::Manager => user::UserRole::Manager,
        UserRole::Cashier => user::UserRole::Cashier,
        UserRole::Admin => user::UserRole::Admin,
        UserRole::Superadmin => user::UserRole::Superadmin,
    }
}

fn entity_status_to_domain(status: user::UserStatus) -> UserStatus {
    match status {
        user::UserStatus::Active => UserStatus::Active,
        user::UserStatus::Inactive => UserStatus::Inactive,
        user::UserStatus::Invited => UserStatus::Invited,
        user::UserStatus::Suspended => UserStatus::Suspended,
    }
}

fn domain_status_to_entity(status: UserStatus) -> user::UserStatus {
    match status {
        UserStatus::Active => user::UserStatus::Active,
        UserStatus::Inactive => user::UserStatus::Inactive,
        UserStatus::Invited => user::UserStatus::Invited,
        UserStatus::Suspended => user::UserStatus::Suspended,
    }
}

fn user_model_to_domain(model: user::Model) -> User {
    User {
        id: model.id,
        name: model.name,
        email: model.email,
        phone_number: model.phone_number,
        password_hash: model.password_hash,
        role: entity_role_to_domain(model.role),
        status: entity_status_to_domain(model.status),
        created_at: model.created_at,
        updated_at: model.updated_at,
    }
}

fn column_to_entity(column: UserColumn) -> user::Column {
    match column {
        UserColumn::Id => user::Column::Id,
        UserColumn::Name => user::Column::Name,
        UserColumn::Email => user::Column::Email,
        UserColumn::PhoneNumber => user::Column::PhoneNumber,
        UserColumn::Role => user::Column::Role,
        UserColumn::Status => user::Column::Status,
        UserColumn::CreatedAt => user::Column::CreatedAt,
    }
}

fn direction_to_order(direction: SortDirection) -> Order {
    match direction {
        SortDirection::Asc => Order::Asc,
        SortDirection::Desc => Order::Desc,
    }
}

/// Escape character for LIKE patterns; no backend treats it specially inside literals
const LIKE_ESCAPE: char = '!';

/// `LOWER(column) LIKE '%needle%' ESCAPE '!'`, with the needle taken literally
fn contains_ci(column: user::Column, needle: &str) -> SimpleExpr {
    let pattern = format!("%{}%", escape_like(&needle.to_lowercase()));
    Expr::expr(Func::lower(Expr::col(column))).like(LikeExpr::new(pattern).escape(LIKE_ESCAPE))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | LIKE_ESCAPE) {
            escaped.push(LIKE_ESCAPE);
        }
        escaped.push(c);
    }
    escaped
}

fn filter_condition(filter: &UserFilter) -> SimpleExpr {
    match filter {
        UserFilter::Name(value) => contains_ci(user::Column::Name, value),
        UserFilter::Email(value) => contains_ci(user::Column::Email, value),
        UserFilter::PhoneNumber(value) => contains_ci(user::Column::PhoneNumber, value),
        UserFilter::Role(role) => user::Column::Role.eq(domain_role_to_entity(*role)),
        UserFilter::Status(status) => user::Column::Status.eq(domain_status_to_entity(*status)),
    }
}

fn db_err(e: sea_orm::DbErr) -> DomainError {
    error!("User repository database error: {}", e);
    InfraError::from(e).into()
}

fn is_unique_violation(e: &sea_orm::DbErr) -> bool {
    let text = e.to_string();
    text.contains("UNIQUE") || text.contains("duplicate")
}

fn email_taken() -> DomainError {
    DomainError::Conflict {
        field: "email",
        message: "The email has already been taken.".to_string(),
    }
}

// ── Repository implementation ───────────────────────────────────

#[async_trait]
impl UserRepositoryInterface for UserRepository {
    async fn create_user(&self, dto: CreateUserDto) -> DomainResult<User> {
        let now = Utc::now();

        let new_user = user::ActiveModel {
            name: Set(dto.name),
            email: Set(dto.email),
            phone_number: Set(dto.phone_number),
            password_hash: Set(dto.password_hash),
            role: Set(domain_role_to_entity(dto.role)),
            status: Set(domain_status_to_entity(dto.status)),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let model = new_user.insert(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                email_taken()
            } else {
                db_err(e)
            }
        })?;

        Ok(user_model_to_domain(model))
    }

    async fn list_users(&self, dto: GetUserDto) -> DomainResult<Page<User>> {
        let page = dto.page.max(1);
        let per_page = dto.per_page.max(1);

        let mut query = user::Entity::find();

        if let Some(ref filter) = dto.filter {
            query = query.filter(filter_condition(filter));
        }

        // Apply sorting; id breaks ties so pages never overlap
        match dto.sort {
            Some((column, direction)) => {
                let order = direction_to_order(direction);
                query = query.order_by(column_to_entity(column), order.clone());
                if column != UserColumn::Id {
                    query = query.order_by(user::Column::Id, order);
                }
            }
            None => {
                query = query
                    .order_by_desc(user::Column::CreatedAt)
                    .order_by_desc(user::Column::Id);
            }
        }

        // Count total
        let total = query.clone().count(&self.db).await.map_err(db_err)?;

        // Paginate; pages past the end come back empty
        let offset = u64::from(page - 1) * u64::from(per_page);
        let models = query
            .offset(offset)
            .limit(u64::from(per_page))
            .all(&self.db)
            .await
            .map_err(db_err)?;

        let items: Vec<User> = models.into_iter().map(user_model_to_domain).collect();

        Ok(Page::new(items, total, page, per_page))
    }

    async fn count_users(&self) -> DomainResult<u64> {
        user::Entity::find().count(&self.db).await.map_err(db_err)
    }

    async fn get_user_by_id(&self, id: i32) -> DomainResult<Option<User>> {
        let model = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn get_user_by_email(&self, email: &str) -> DomainResult<Option<User>> {
        let model = user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&self.db)
            .await
            .map_err(db_err)?;

        Ok(model.map(user_model_to_domain))
    }

    async fn update_user(&self, id: i32, dto: UpdateUserDto) -> DomainResult<Option<User>> {
        let existing = user::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .map_err(db_err)?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        let mut active: user::ActiveModel = existing.into();
        active.name = Set(dto.name);
        active.email = Set(dto.email);
        active.phone_number = Set(dto.phone_number);
        active.role = Set(domain_role_to_entity(dto.role));
        if let Some(hash) = dto.password_hash {
            active.password_hash = Set(hash);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&self.db).await.map_err(|e| {
            if is_unique_violation(&e) {
                email_taken()
            } else {
                db_err(e)
            }
        })?;

        Ok(Some(user_model_to_domain(updated)))
    }

    async fn delete_user(&self, id: i32) -> DomainResult<()> {
        let result = user::Entity::delete_by_id(id)
            .exec(&self.db)
            .await
            .map_err(db_err)?;

        if result.rows_affected == 0 {
            return Err(DomainError::NotFound {
                entity: "User",
                field: "id",
                value: id.to_string(),
            });
        }

        Ok(())
    }
}
