use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::sea_query::Expr;
use sea_orm::*;

use crate::errors::LedgerError;
use crate::models::dto::CreateTradeRequest;
use crate::models::trade::{self, TradeSide, TradeStatus};
use crate::services::portfolio_service::PortfolioService;

/// The core of the simulator: opens and closes trades against a user's
/// SimCash balance. Every operation is one database transaction, so either
/// both the balance mutation and the trade row are visible or neither is.
///
/// Identity is always an explicit parameter; the service never reaches into
/// request state.
pub struct LedgerService;

impl LedgerService {
    /// Open a trade.
    ///
    /// Buys debit `entry_price * size` up front through the conditional
    /// debit in PortfolioService; a buy that would overdraw the balance
    /// fails with InsufficientFunds and mutates nothing. Sells open a short
    /// with no upfront debit (simplified cash-account model) - only the pnl
    /// moves the balance, at close time.
    pub async fn open_trade(
        db: &DatabaseConnection,
        user_id: &str,
        request: CreateTradeRequest,
    ) -> Result<trade::Model, LedgerError> {
        Self::validate_open(&request)?;

        let cost = request.entry_price * request.size;

        let txn = db.begin().await?;

        let portfolio = PortfolioService::get_or_create(&txn, user_id).await?;

        if request.side == TradeSide::Buy
            && !PortfolioService::try_debit(&txn, user_id, cost).await?
        {
            // Dropping the transaction rolls it back; the failed conditional
            // update touched nothing anyway.
            return Err(LedgerError::InsufficientFunds {
                required: cost,
                available: portfolio.balance,
            });
        }

        let (risk_amount, reward_amount, rr_ratio) = Self::risk_metrics(&request);

        let new_trade = trade::ActiveModel {
            user_id: Set(user_id.to_string()),
            symbol: Set(request.symbol.clone()),
            side: Set(request.side),
            size: Set(request.size),
            entry_price: Set(request.entry_price),
            exit_price: Set(None),
            stop_loss: Set(request.stop_loss),
            take_profit: Set(request.take_profit),
            risk_amount: Set(risk_amount),
            reward_amount: Set(reward_amount),
            rr_ratio: Set(rr_ratio),
            pnl: Set(None),
            status: Set(TradeStatus::Open),
            entry_time: Set(Utc::now()),
            exit_time: Set(None),
            ..Default::default()
        };

        let created = new_trade.insert(&txn).await?;
        txn.commit().await?;

        log::info!(
            "opened trade {} for user {}: {:?} {} {} @ {}",
            created.id,
            user_id,
            created.side,
            created.size,
            created.symbol,
            created.entry_price
        );
        Ok(created)
    }

    /// Close an open trade at the supplied exit price.
    ///
    /// The exit price comes from the caller (the quote provider feeds it at
    /// the edge); the ledger does not fetch or second-guess quotes. The
    /// open -> closed transition is a conditional UPDATE filtered on
    /// `status = open`, so a repeated or concurrent close finds zero rows
    /// and fails with AlreadyClosed instead of crediting twice.
    pub async fn close_trade(
        db: &DatabaseConnection,
        user_id: &str,
        trade_id: i32,
        exit_price: Decimal,
    ) -> Result<trade::Model, LedgerError> {
        if exit_price <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "exitPrice must be greater than 0".to_string(),
            ));
        }

        let txn = db.begin().await?;

        let trade = trade::Entity::find_by_id(trade_id)
            .one(&txn)
            .await?
            .ok_or(LedgerError::NotFound)?;

        // Foreign trades look exactly like missing ones
        if trade.user_id != user_id {
            return Err(LedgerError::NotFound);
        }

        if trade.status == TradeStatus::Closed {
            return Err(LedgerError::AlreadyClosed);
        }

        let pnl = Self::realized_pnl(trade.side, trade.entry_price, exit_price, trade.size);
        let proceeds = Self::close_proceeds(trade.side, trade.entry_price, exit_price, trade.size);
        let exit_time = Utc::now();

        let transition = trade::Entity::update_many()
            .col_expr(trade::Column::Status, Expr::value(TradeStatus::Closed))
            .col_expr(trade::Column::ExitPrice, Expr::value(exit_price))
            .col_expr(trade::Column::ExitTime, Expr::value(exit_time))
            .col_expr(trade::Column::Pnl, Expr::value(pnl))
            .filter(trade::Column::Id.eq(trade_id))
            .filter(trade::Column::Status.eq(TradeStatus::Open))
            .exec(&txn)
            .await?;

        if transition.rows_affected == 0 {
            return Err(LedgerError::AlreadyClosed);
        }

        PortfolioService::credit(&txn, user_id, proceeds, pnl).await?;
        txn.commit().await?;

        log::info!(
            "closed trade {} for user {}: pnl {}",
            trade_id,
            user_id,
            pnl
        );

        Ok(trade::Model {
            exit_price: Some(exit_price),
            exit_time: Some(exit_time),
            pnl: Some(pnl),
            status: TradeStatus::Closed,
            ..trade
        })
    }

    /// Realized P&L: longs gain when price rises, shorts when it falls.
    pub fn realized_pnl(
        side: TradeSide,
        entry_price: Decimal,
        exit_price: Decimal,
        size: Decimal,
    ) -> Decimal {
        match side {
            TradeSide::Buy => (exit_price - entry_price) * size,
            TradeSide::Sell => (entry_price - exit_price) * size,
        }
    }

    /// Balance credit at close. A buy returns principal plus pnl, which is
    /// exactly `exit_price * size`. A short never paid principal, so only
    /// the pnl moves (possibly negative).
    pub fn close_proceeds(
        side: TradeSide,
        entry_price: Decimal,
        exit_price: Decimal,
        size: Decimal,
    ) -> Decimal {
        let pnl = Self::realized_pnl(side, entry_price, exit_price, size);
        match side {
            TradeSide::Buy => entry_price * size + pnl,
            TradeSide::Sell => pnl,
        }
    }

    fn validate_open(request: &CreateTradeRequest) -> Result<(), LedgerError> {
        if request.symbol.trim().is_empty() {
            return Err(LedgerError::Validation("symbol is required".to_string()));
        }
        if request.size <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "size must be greater than 0".to_string(),
            ));
        }
        if request.entry_price <= Decimal::ZERO {
            return Err(LedgerError::Validation(
                "entryPrice must be greater than 0".to_string(),
            ));
        }
        if matches!(request.stop_loss, Some(level) if level <= Decimal::ZERO) {
            return Err(LedgerError::Validation(
                "stopLoss must be greater than 0".to_string(),
            ));
        }
        if matches!(request.take_profit, Some(level) if level <= Decimal::ZERO) {
            return Err(LedgerError::Validation(
                "takeProfit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Advisory risk metrics from the stop/target levels, computed once at
    /// open: risk = |entry - stop| * size, reward = |target - entry| * size,
    /// rr = reward / risk.
    fn risk_metrics(
        request: &CreateTradeRequest,
    ) -> (Option<Decimal>, Option<Decimal>, Option<Decimal>) {
        let risk_amount = request
            .stop_loss
            .map(|stop| (request.entry_price - stop).abs() * request.size);
        let reward_amount = request
            .take_profit
            .map(|target| (target - request.entry_price).abs() * request.size);

        let rr_ratio = match (risk_amount, reward_amount) {
            (Some(risk), Some(reward)) if risk > Decimal::ZERO => Some(reward / risk),
            _ => None,
        };

        (risk_amount, reward_amount, rr_ratio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::portfolio;
    use sea_orm::{DatabaseBackend, MockDatabase, MockExecResult};

    const USER: &str = "8d6f9c2e-0000-0000-0000-000000000001";

    fn dec(value: i64, scale: u32) -> Decimal {
        Decimal::new(value, scale)
    }

    fn portfolio_row(balance: Decimal) -> portfolio::Model {
        let now = Utc::now();
        portfolio::Model {
            id: 1,
            user_id: USER.to_string(),
            balance,
            total_profit_loss: Decimal::ZERO,
            track: None,
            experience: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn open_trade_row(side: TradeSide, size: Decimal, entry_price: Decimal) -> trade::Model {
        trade::Model {
            id: 7,
            user_id: USER.to_string(),
            symbol: "SMBY".to_string(),
            side,
            size,
            entry_price,
            exit_price: None,
            stop_loss: None,
            take_profit: None,
            risk_amount: None,
            reward_amount: None,
            rr_ratio: None,
            pnl: None,
            status: TradeStatus::Open,
            entry_time: Utc::now(),
            exit_time: None,
        }
    }

    fn buy_request(size: Decimal, entry_price: Decimal) -> CreateTradeRequest {
        CreateTradeRequest {
            symbol: "SMBY".to_string(),
            side: TradeSide::Buy,
            size,
            entry_price,
            stop_loss: None,
            take_profit: None,
        }
    }

    // --- pure ledger math -------------------------------------------------

    #[test]
    fn pnl_of_the_reference_buy_scenario() {
        // size 10 @ 145.30 closed at 152.45 -> 71.50
        let pnl = LedgerService::realized_pnl(TradeSide::Buy, dec(14530, 2), dec(15245, 2), dec(10, 0));
        assert_eq!(pnl, dec(7150, 2));

        let proceeds =
            LedgerService::close_proceeds(TradeSide::Buy, dec(14530, 2), dec(15245, 2), dec(10, 0));
        assert_eq!(proceeds, dec(152450, 2));
    }

    #[test]
    fn pnl_of_the_reference_short_scenario() {
        // short size 5 @ 50.00 closed at 40.00 -> +50.00, credited as-is
        let pnl = LedgerService::realized_pnl(TradeSide::Sell, dec(50, 0), dec(40, 0), dec(5, 0));
        assert_eq!(pnl, dec(50, 0));

        let proceeds =
            LedgerService::close_proceeds(TradeSide::Sell, dec(50, 0), dec(40, 0), dec(5, 0));
        assert_eq!(proceeds, dec(50, 0));
    }

    #[test]
    fn closing_a_buy_at_entry_price_is_pnl_neutral() {
        let entry = dec(9999, 2);
        let size = dec(3, 0);
        assert_eq!(
            LedgerService::realized_pnl(TradeSide::Buy, entry, entry, size),
            Decimal::ZERO
        );
        // proceeds == cost, so the balance returns to its pre-open value
        assert_eq!(
            LedgerService::close_proceeds(TradeSide::Buy, entry, entry, size),
            entry * size
        );
    }

    #[test]
    fn losing_short_produces_negative_proceeds() {
        let proceeds =
            LedgerService::close_proceeds(TradeSide::Sell, dec(40, 0), dec(50, 0), dec(5, 0));
        assert_eq!(proceeds, dec(-50, 0));
    }

    // --- open -------------------------------------------------------------

    #[tokio::test]
    async fn open_buy_debits_cost_and_inserts_the_trade() {
        let created = open_trade_row(TradeSide::Buy, dec(10, 0), dec(14530, 2));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![portfolio_row(dec(10000_00, 2))]])
            .append_query_results([vec![created.clone()]])
            .append_exec_results([
                // conditional debit applies
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                MockExecResult {
                    last_insert_id: 7,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let trade = LedgerService::open_trade(&db, USER, buy_request(dec(10, 0), dec(14530, 2)))
            .await
            .unwrap();

        assert_eq!(trade.status, TradeStatus::Open);
        assert_eq!(trade.entry_price, dec(14530, 2));
        assert_eq!(trade.pnl, None);
        assert_eq!(trade.exit_price, None);
    }

    #[tokio::test]
    async fn underfunded_buy_fails_without_touching_the_trade_table() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![portfolio_row(dec(100_00, 2))]])
            .append_exec_results([
                // balance 100.00 < cost 150.00 -> conditional debit matches no row
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 0,
                },
            ])
            .into_connection();

        let result = LedgerService::open_trade(&db, USER, buy_request(dec(1, 0), dec(150_00, 2))).await;

        match result {
            Err(LedgerError::InsufficientFunds {
                required,
                available,
            }) => {
                assert_eq!(required, dec(150_00, 2));
                assert_eq!(available, dec(100_00, 2));
            }
            other => panic!("expected InsufficientFunds, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn open_short_skips_the_debit() {
        let created = open_trade_row(TradeSide::Sell, dec(5, 0), dec(50, 0));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![portfolio_row(dec(10000_00, 2))]])
            .append_query_results([vec![created.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 7,
                rows_affected: 1,
            }])
            .into_connection();

        let request = CreateTradeRequest {
            symbol: "SMBY".to_string(),
            side: TradeSide::Sell,
            size: dec(5, 0),
            entry_price: dec(50, 0),
            stop_loss: None,
            take_profit: None,
        };

        let trade = LedgerService::open_trade(&db, USER, request).await.unwrap();
        assert_eq!(trade.side, TradeSide::Sell);
        assert_eq!(trade.status, TradeStatus::Open);
    }

    #[tokio::test]
    async fn open_rejects_non_positive_size_before_any_io() {
        // No results appended: a query would make the mock fail the test
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();

        let result = LedgerService::open_trade(&db, USER, buy_request(Decimal::ZERO, dec(1, 0))).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));

        let result =
            LedgerService::open_trade(&db, USER, buy_request(dec(1, 0), dec(-5, 0))).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    // --- close ------------------------------------------------------------

    #[tokio::test]
    async fn close_buy_credits_exit_value_and_terminates_the_trade() {
        let open = open_trade_row(TradeSide::Buy, dec(10, 0), dec(14530, 2));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![open.clone()]])
            .append_exec_results([
                // open -> closed transition
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
                // balance credit
                MockExecResult {
                    last_insert_id: 0,
                    rows_affected: 1,
                },
            ])
            .into_connection();

        let closed = LedgerService::close_trade(&db, USER, open.id, dec(15245, 2))
            .await
            .unwrap();

        assert_eq!(closed.status, TradeStatus::Closed);
        assert_eq!(closed.pnl, Some(dec(7150, 2)));
        assert_eq!(closed.exit_price, Some(dec(15245, 2)));
        assert!(closed.exit_time.is_some());
    }

    #[tokio::test]
    async fn close_is_rejected_on_an_already_closed_trade() {
        let mut closed = open_trade_row(TradeSide::Buy, dec(10, 0), dec(14530, 2));
        closed.status = TradeStatus::Closed;
        closed.exit_price = Some(dec(15245, 2));
        closed.pnl = Some(dec(7150, 2));
        closed.exit_time = Some(Utc::now());

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![closed.clone()]])
            .into_connection();

        let result = LedgerService::close_trade(&db, USER, closed.id, dec(160_00, 2)).await;
        assert!(matches!(result, Err(LedgerError::AlreadyClosed)));
    }

    #[tokio::test]
    async fn concurrent_close_losing_the_race_is_already_closed() {
        // The row still reads open, but the conditional transition finds no
        // open row to update - the other close won.
        let open = open_trade_row(TradeSide::Buy, dec(10, 0), dec(14530, 2));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![open.clone()]])
            .append_exec_results([MockExecResult {
                last_insert_id: 0,
                rows_affected: 0,
            }])
            .into_connection();

        let result = LedgerService::close_trade(&db, USER, open.id, dec(15245, 2)).await;
        assert!(matches!(result, Err(LedgerError::AlreadyClosed)));
    }

    #[tokio::test]
    async fn closing_an_unknown_trade_is_not_found() {
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<trade::Model>::new()])
            .into_connection();

        let result = LedgerService::close_trade(&db, USER, 999, dec(10, 0)).await;
        assert!(matches!(result, Err(LedgerError::NotFound)));
    }

    #[tokio::test]
    async fn closing_someone_elses_trade_is_indistinguishable_from_missing() {
        let mut foreign = open_trade_row(TradeSide::Buy, dec(1, 0), dec(10, 0));
        foreign.user_id = "someone-else".to_string();

        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![foreign.clone()]])
            .into_connection();

        let result = LedgerService::close_trade(&db, USER, foreign.id, dec(10, 0)).await;
        assert!(matches!(result, Err(LedgerError::NotFound)));
    }

    #[tokio::test]
    async fn close_rejects_non_positive_exit_price() {
        let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
        let result = LedgerService::close_trade(&db, USER, 1, Decimal::ZERO).await;
        assert!(matches!(result, Err(LedgerError::Validation(_))));
    }

    // --- risk metrics -----------------------------------------------------

    #[test]
    fn risk_metrics_follow_the_advisory_levels() {
        let request = CreateTradeRequest {
            symbol: "SMBY".to_string(),
            side: TradeSide::Buy,
            size: dec(10, 0),
            entry_price: dec(100, 0),
            stop_loss: Some(dec(95, 0)),
            take_profit: Some(dec(110, 0)),
        };

        let (risk, reward, rr) = LedgerService::risk_metrics(&request);
        assert_eq!(risk, Some(dec(50, 0)));
        assert_eq!(reward, Some(dec(100, 0)));
        assert_eq!(rr, Some(dec(2, 0)));
    }

    #[test]
    fn risk_metrics_absent_without_levels() {
        let request = buy_request(dec(10, 0), dec(100, 0));
        let (risk, reward, rr) = LedgerService::risk_metrics(&request);
        assert_eq!(risk, None);
        assert_eq!(reward, None);
        assert_eq!(rr, None);
    }
}
