// ==========================================
// Order Flow - derived-state deriver
// ==========================================
// Pure computation over an order's quantity and date fields,
// invoked right after each upsert. Outputs are appended into the
// history tables by the caller, never substituted.
// ==========================================

use crate::domain::{Order, OrderStatus, SectorCode, SectorState};
use chrono::{DateTime, Utc};

/// Portuguese operator-facing reason carried on delayed statuses,
/// as the upstream system reports it.
pub const REASON_DEADLINE_PASSED: &str = "Prazo ultrapassado";

/// Result of one derivation pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedState {
    pub status: OrderStatus,
    pub status_reason: Option<String>,
    pub sector: SectorCode,
    pub sector_state: SectorState,
    /// Message of the late-order alert to raise, if any. Emitted on
    /// every touch of a late order with no dedup against existing
    /// unresolved alerts (inherited upstream behavior).
    pub late_alert_message: Option<String>,
}

pub struct StateDeriver;

impl StateDeriver {
    /// Derive status, sector placement and alerting for the
    /// post-write order snapshot.
    pub fn derive(order: &Order, now: DateTime<Utc>) -> DerivedState {
        let status = Self::derive_status(order, now);
        let status_reason = match status {
            OrderStatus::Delayed => Some(REASON_DEADLINE_PASSED.to_string()),
            _ => None,
        };

        let sector = Self::derive_sector(order);

        let sector_state = match status {
            OrderStatus::Completed => SectorState::Done,
            OrderStatus::Delayed => SectorState::Late,
            OrderStatus::InProgress => SectorState::OnTime,
        };

        let late_alert_message = if order.qty_open > 0.0 && Self::deadline_passed(order, now) {
            Some(format!("Encomenda {} atrasada", order.doc_nr))
        } else {
            None
        };

        DerivedState {
            status,
            status_reason,
            sector,
            sector_state,
            late_alert_message,
        }
    }

    /// Completed wins on zero open quantity regardless of dates;
    /// otherwise a passed requested date means delayed.
    fn derive_status(order: &Order, now: DateTime<Utc>) -> OrderStatus {
        if order.qty_open == 0.0 {
            OrderStatus::Completed
        } else if Self::deadline_passed(order, now) {
            OrderStatus::Delayed
        } else {
            OrderStatus::InProgress
        }
    }

    fn deadline_passed(order: &Order, now: DateTime<Utc>) -> bool {
        matches!(order.requested_date, Some(requested) if requested < now)
    }

    /// Priority funnel over the six-stage linear pipeline, evaluated
    /// from the most downstream stage backward: the most advanced
    /// stage with unconsumed quantity wins. Falls through to
    /// weaving when no stage quantity is positive.
    fn derive_sector(order: &Order) -> SectorCode {
        type StagePredicate = fn(&Order) -> f64;
        const FUNNEL: [(StagePredicate, SectorCode); 5] = [
            (|o| o.stock_cx, SectorCode::Expedicao),
            (|o| o.emb_acab, SectorCode::Embalagem),
            (|o| o.confeccao_roupoes + o.confeccao_felpos, SectorCode::Confeccao),
            (|o| o.tinturaria, SectorCode::Tinturaria),
            (|o| o.felpo_cru, SectorCode::FelpoCru),
        ];

        for (stage_qty, sector) in FUNNEL {
            if stage_qty(order) > 0.0 {
                return sector;
            }
        }
        SectorCode::Tecelagem
    }
}
