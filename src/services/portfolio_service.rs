use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, ExprTrait};
use sea_orm::*;

use crate::errors::LedgerError;
use crate::models::{portfolio, trade};

pub struct PortfolioService;

impl PortfolioService {
    /// Fixed starting SimCash balance: 10,000.00
    pub fn starting_balance() -> Decimal {
        Decimal::new(1_000_000, 2)
    }

    /// Fetch the user's portfolio, creating it with the starting balance if
    /// this is the first authenticated access. Idempotent.
    pub async fn get_or_create<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
    ) -> Result<portfolio::Model, LedgerError> {
        if let Some(existing) = portfolio::Entity::find()
            .filter(portfolio::Column::UserId.eq(user_id))
            .one(db)
            .await?
        {
            return Ok(existing);
        }

        Self::insert_new(db, user_id, None, None).await
    }

    /// Explicit onboarding. Unlike get_or_create this fails if the user
    /// already has a portfolio.
    pub async fn create<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        track: Option<String>,
        experience: Option<String>,
    ) -> Result<portfolio::Model, LedgerError> {
        let existing = portfolio::Entity::find()
            .filter(portfolio::Column::UserId.eq(user_id))
            .one(db)
            .await?;

        if existing.is_some() {
            return Err(LedgerError::Validation(
                "Portfolio already exists".to_string(),
            ));
        }

        Self::insert_new(db, user_id, track, experience).await
    }

    async fn insert_new<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        track: Option<String>,
        experience: Option<String>,
    ) -> Result<portfolio::Model, LedgerError> {
        let now = Utc::now();
        let new_portfolio = portfolio::ActiveModel {
            user_id: Set(user_id.to_string()),
            balance: Set(Self::starting_balance()),
            total_profit_loss: Set(Decimal::ZERO),
            track: Set(track),
            experience: Set(experience),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        Ok(new_portfolio.insert(db).await?)
    }

    /// Debit `amount` only if the balance covers it, as a single conditional
    /// UPDATE. Returns whether the debit applied. The funds check and the
    /// subtraction happen in one statement, so two concurrent debits can
    /// never both succeed against a stale balance.
    pub async fn try_debit<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        amount: Decimal,
    ) -> Result<bool, LedgerError> {
        let result = portfolio::Entity::update_many()
            .col_expr(
                portfolio::Column::Balance,
                Expr::col(portfolio::Column::Balance).sub(amount),
            )
            .col_expr(portfolio::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(portfolio::Column::UserId.eq(user_id))
            .filter(portfolio::Column::Balance.gte(amount))
            .exec(db)
            .await?;

        Ok(result.rows_affected == 1)
    }

    /// Credit close proceeds and fold the realized pnl into the advisory
    /// aggregate in one UPDATE. `amount` may be negative (losing short).
    pub async fn credit<C: ConnectionTrait>(
        db: &C,
        user_id: &str,
        amount: Decimal,
        realized_pnl: Decimal,
    ) -> Result<(), LedgerError> {
        let result = portfolio::Entity::update_many()
            .col_expr(
                portfolio::Column::Balance,
                Expr::col(portfolio::Column::Balance).add(amount),
            )
            .col_expr(
                portfolio::Column::TotalProfitLoss,
                Expr::col(portfolio::Column::TotalProfitLoss).add(realized_pnl),
            )
            .col_expr(portfolio::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(portfolio::Column::UserId.eq(user_id))
            .exec(db)
            .await?;

        if result.rows_affected == 0 {
            // A close always runs against an existing portfolio
            return Err(LedgerError::Db(DbErr::RecordNotUpdated));
        }

        Ok(())
    }

    /// Restore the starting balance, zero the P&L aggregate and purge every
    /// trade (open and closed) as a single transaction.
    pub async fn reset(
        db: &DatabaseConnection,
        user_id: &str,
    ) -> Result<portfolio::Model, LedgerError> {
        let txn = db.begin().await?;

        let current = Self::get_or_create(&txn, user_id).await?;

        trade::Entity::delete_many()
            .filter(trade::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?;

        let mut active: portfolio::ActiveModel = current.into();
        active.balance = Set(Self::starting_balance());
        active.total_profit_loss = Set(Decimal::ZERO);
        active.updated_at = Set(Utc::now());
        let restored = active.update(&txn).await?;

        txn.commit().await?;

        log::info!("portfolio reset for user {}", user_id);
        Ok(restored)
    }
}
