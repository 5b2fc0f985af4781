//! Relational persistence for orders, fills, positions, and the decision
//! audit trail. The store is the single source of truth on restart; the
//! accountant rehydrates positions from it and the reconciler relies on
//! the exchange-reported live order set rather than anything persisted
//! here.

use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{params, Connection};

use crate::model::order::{Decision, OpenOrder, OrderStatus, RiskMetrics};
use crate::model::Position;
use crate::types::{Fill, IntentMode, Side};

#[derive(Clone)]
pub struct StateStore {
    path: String,
}

impl StateStore {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        if path.trim().is_empty() {
            anyhow::bail!("DB_PATH is empty");
        }
        if path != ":memory:" && !path.starts_with("file:") {
            if let Some(parent) = Path::new(&path).parent() {
                if !parent.as_os_str().is_empty() {
                    std::fs::create_dir_all(parent).with_context(|| format!("create sqlite parent dir for {path}"))?;
                }
            }
        }
        Ok(Self { path })
    }

    fn open_conn(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path).with_context(|| format!("open sqlite {}", self.path))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Ok(conn)
    }

    /// Create tables and indices if they don't already exist. Safe to call
    /// on every startup.
    pub fn migrate(&self) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute_batch(
            r#"
CREATE TABLE IF NOT EXISTS orders (
  order_id TEXT PRIMARY KEY,
  token_id TEXT NOT NULL,
  side TEXT NOT NULL,
  price REAL NOT NULL,
  size REAL NOT NULL,
  filled_size REAL NOT NULL,
  status TEXT NOT NULL,
  reason TEXT,
  created_ts INTEGER NOT NULL,
  updated_ts INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_orders_token ON orders(token_id);

CREATE TABLE IF NOT EXISTS fills (
  fill_id TEXT PRIMARY KEY,
  order_id TEXT NOT NULL,
  token_id TEXT NOT NULL,
  side TEXT NOT NULL,
  price REAL NOT NULL,
  size REAL NOT NULL,
  fee REAL NOT NULL,
  ts INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_fills_order ON fills(order_id);
CREATE INDEX IF NOT EXISTS idx_fills_ts ON fills(ts);

CREATE TABLE IF NOT EXISTS positions (
  token_id TEXT PRIMARY KEY,
  qty REAL NOT NULL,
  avg_cost REAL NOT NULL,
  realized_pnl REAL NOT NULL,
  updated_ts INTEGER NOT NULL
);

CREATE TABLE IF NOT EXISTS decisions (
  id INTEGER PRIMARY KEY AUTOINCREMENT,
  token_id TEXT NOT NULL,
  side TEXT NOT NULL,
  price REAL NOT NULL,
  size REAL NOT NULL,
  mode TEXT NOT NULL,
  reason TEXT,
  accepted INTEGER NOT NULL,
  rejection_reason TEXT,
  ts INTEGER NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_decisions_ts ON decisions(ts);
"#,
        )?;
        Ok(())
    }

    pub fn insert_order(&self, order: &OpenOrder, reason: &str, now_ms: i64) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute(
            r#"
INSERT INTO orders(order_id, token_id, side, price, size, filled_size, status, reason, created_ts, updated_ts)
VALUES(?,?,?,?,?,?,?,?,?,?)
ON CONFLICT(order_id) DO UPDATE SET
  price=excluded.price, size=excluded.size, filled_size=excluded.filled_size,
  status=excluded.status, updated_ts=excluded.updated_ts
"#,
            params![
                order.order_id,
                order.token_id,
                order.side.as_str(),
                order.price,
                order.size,
                order.filled_size,
                order.status.as_str(),
                reason,
                order.created_at_ms,
                now_ms,
            ],
        )?;
        Ok(())
    }

    pub fn update_order_status(&self, order_id: &str, status: OrderStatus, filled_size: Option<f64>, now_ms: i64) -> Result<()> {
        let conn = self.open_conn()?;
        match filled_size {
            None => {
                conn.execute(
                    "UPDATE orders SET status=?, updated_ts=? WHERE order_id=?",
                    params![status.as_str(), now_ms, order_id],
                )?;
            }
            Some(fs) => {
                conn.execute(
                    "UPDATE orders SET status=?, filled_size=?, updated_ts=? WHERE order_id=?",
                    params![status.as_str(), fs, now_ms, order_id],
                )?;
            }
        }
        Ok(())
    }

    pub fn insert_fill(&self, fill: &Fill) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute(
            r#"
INSERT OR REPLACE INTO fills(fill_id, order_id, token_id, side, price, size, fee, ts)
VALUES(?,?,?,?,?,?,?,?)
"#,
            params![fill.fill_id, fill.order_id, fill.token_id, fill.side.as_str(), fill.price, fill.size, fill.fee, fill.ts_ms],
        )?;
        Ok(())
    }

    pub fn upsert_position(&self, position: &Position, now_ms: i64) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute(
            r#"
INSERT INTO positions(token_id, qty, avg_cost, realized_pnl, updated_ts)
VALUES(?,?,?,?,?)
ON CONFLICT(token_id) DO UPDATE SET
  qty=excluded.qty, avg_cost=excluded.avg_cost, realized_pnl=excluded.realized_pnl, updated_ts=excluded.updated_ts
"#,
            params![position.token_id, position.qty, position.avg_cost, position.realized_pnl, now_ms],
        )?;
        Ok(())
    }

    /// Load all persisted positions, used to rehydrate the accountant on
    /// restart.
    pub fn load_positions(&self) -> Result<Vec<Position>> {
        let conn = self.open_conn()?;
        let mut stmt = conn.prepare("SELECT token_id, qty, avg_cost, realized_pnl FROM positions")?;
        let rows = stmt.query_map([], |row| {
            Ok(Position {
                token_id: row.get(0)?,
                qty: row.get(1)?,
                avg_cost: row.get(2)?,
                realized_pnl: row.get(3)?,
            })
        })?;
        rows.collect::<rusqlite::Result<Vec<_>>>().context("loading positions")
    }

    pub fn insert_decision(&self, decision: &Decision) -> Result<()> {
        let conn = self.open_conn()?;
        conn.execute(
            r#"
INSERT INTO decisions(token_id, side, price, size, mode, reason, accepted, rejection_reason, ts)
VALUES(?,?,?,?,?,?,?,?,?)
"#,
            params![
                decision.token_id,
                decision.side.as_str(),
                decision.price,
                decision.size,
                decision.mode.as_str(),
                decision.reason,
                decision.accepted as i64,
                decision.rejection_reason,
                decision.ts_ms,
            ],
        )?;
        Ok(())
    }

    /// Orders not yet in a terminal state, optionally scoped to one token.
    /// Used on restart to seed the reconciler before the exchange's own
    /// open-order list is available, and by dashboards.
    pub fn get_open_orders(&self, token_id: Option<&str>) -> Result<Vec<OpenOrder>> {
        let conn = self.open_conn()?;
        let sql = "SELECT order_id, token_id, side, price, size, filled_size, status, created_ts \
                    FROM orders WHERE status IN ('open','partially_filled')";
        let map_row = |row: &rusqlite::Row| -> rusqlite::Result<(String, String, String, f64, f64, f64, String, i64)> {
            Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?, row.get(5)?, row.get(6)?, row.get(7)?))
        };
        let raw: Vec<_> = match token_id {
            Some(token_id) => {
                let mut stmt = conn.prepare(&format!("{sql} AND token_id = ?"))?;
                stmt.query_map(params![token_id], |row| map_row(row))?.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let mut stmt = conn.prepare(sql)?;
                stmt.query_map([], |row| map_row(row))?.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };
        raw.into_iter()
            .map(|(order_id, token_id, side, price, size, filled_size, status, created_at_ms)| {
                Ok(OpenOrder {
                    order_id,
                    token_id,
                    side: Side::parse(&side)?,
                    price,
                    size,
                    filled_size,
                    status: OrderStatus::parse(&status)?,
                    created_at_ms,
                })
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .context("decoding stored orders")
    }

    /// Fills, optionally scoped to one token and/or a `[start_ts, end_ts)`
    /// window in epoch milliseconds.
    pub fn get_fills(&self, token_id: Option<&str>, start_ts: Option<i64>, end_ts: Option<i64>) -> Result<Vec<Fill>> {
        let conn = self.open_conn()?;
        let mut sql = "SELECT fill_id, order_id, token_id, side, price, size, fee, ts FROM fills WHERE 1=1".to_string();
        let mut bound: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();
        if let Some(token_id) = token_id {
            sql.push_str(" AND token_id = ?");
            bound.push(Box::new(token_id.to_string()));
        }
        if let Some(start_ts) = start_ts {
            sql.push_str(" AND ts >= ?");
            bound.push(Box::new(start_ts));
        }
        if let Some(end_ts) = end_ts {
            sql.push_str(" AND ts < ?");
            bound.push(Box::new(end_ts));
        }
        let mut stmt = conn.prepare(&sql)?;
        let param_refs: Vec<&dyn rusqlite::ToSql> = bound.iter().map(|b| b.as_ref()).collect();
        let raw = stmt.query_map(param_refs.as_slice(), |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, f64>(4)?,
                row.get::<_, f64>(5)?,
                row.get::<_, f64>(6)?,
                row.get::<_, i64>(7)?,
            ))
        })?;
        raw.collect::<rusqlite::Result<Vec<_>>>()
            .context("loading fills")?
            .into_iter()
            .map(|(fill_id, order_id, token_id, side, price, size, fee, ts_ms)| {
                Ok(Fill { fill_id, order_id, token_id, side: Side::parse(&side)?, price, size, fee, ts_ms })
            })
            .collect::<anyhow::Result<Vec<_>>>()
            .context("decoding stored fills")
    }

    /// All currently tracked positions (including flat/closed ones still
    /// carrying realized P&L).
    pub fn get_all_positions(&self) -> Result<Vec<Position>> {
        self.load_positions()
    }

    /// Aggregate risk posture computed from persisted state, for dashboards
    /// and post-hoc review. `daily_pnl` and `daily_taker_volume` are windowed
    /// to the trailing 24 hours ending at `now_ms`; the gate itself checks
    /// limits against live in-memory state, not this query.
    pub fn risk_metrics(&self, now_ms: i64) -> Result<RiskMetrics> {
        let conn = self.open_conn()?;
        let day_ago = now_ms - 24 * 60 * 60 * 1000;
        let minute_ago = now_ms - 60 * 1000;

        let total_notional: f64 = conn.query_row(
            "SELECT COALESCE(SUM((size - filled_size) * price), 0.0) FROM orders WHERE status IN ('open','partially_filled')",
            [],
            |row| row.get(0),
        )?;
        let num_open_orders: i64 = conn.query_row(
            "SELECT COUNT(*) FROM orders WHERE status IN ('open','partially_filled')",
            [],
            |row| row.get(0),
        )?;
        let orders_last_minute: i64 =
            conn.query_row("SELECT COUNT(*) FROM orders WHERE created_ts >= ?", params![minute_ago], |row| row.get(0))?;
        let max_position_notional: f64 =
            conn.query_row("SELECT COALESCE(MAX(ABS(qty) * avg_cost), 0.0) FROM positions", [], |row| row.get(0))?;
        let daily_pnl: f64 = conn.query_row("SELECT COALESCE(SUM(realized_pnl), 0.0) FROM positions", [], |row| row.get(0))?;
        let daily_taker_volume: f64 = conn.query_row(
            "SELECT COALESCE(SUM(price * size), 0.0) FROM decisions WHERE accepted = 1 AND mode = ? AND ts >= ?",
            params![IntentMode::Taker.as_str(), day_ago],
            |row| row.get(0),
        )?;

        Ok(RiskMetrics {
            total_notional,
            max_position_notional,
            num_open_orders: num_open_orders as u32,
            daily_pnl,
            daily_taker_volume,
            orders_last_minute: orders_last_minute as u32,
        })
    }
}
