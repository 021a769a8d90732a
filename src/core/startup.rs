use anyhow::Result;
use tracing::{info, warn};

use crate::core::state::AppState;
use crate::models::{hit_result::HitResult, user::User};
use crate::wal::wal::WalOperation;

/// Rebuild the in-memory stores from replayed WAL operations
///
/// Operations are applied in log order. Entries that reference users
/// not seen earlier in the log are skipped.
pub fn apply_wal_operations(state: &AppState, operations: &[WalOperation]) -> Result<()> {
    let mut skipped = 0usize;

    for op in operations {
        match op {
            WalOperation::Register {
                id,
                login,
                password_hash,
            } => {
                let user = User::new(*id, login.clone(), password_hash.clone());
                state.user_store.restore_user(user);
            }
            WalOperation::IssueToken {
                user_id,
                token,
                issued_at,
            } => {
                if state
                    .user_store
                    .restore_token(*user_id, token.clone(), *issued_at)
                    .is_none()
                {
                    warn!(user_id = user_id, "Token issued to unknown user, skipping");
                    skipped += 1;
                }
            }
            WalOperation::RecordResult {
                id,
                user_id,
                x,
                y,
                r,
                hit,
                ts,
            } => {
                if !state.user_store.contains(*user_id) {
                    warn!(
                        result_id = id,
                        user_id = user_id,
                        "Result for unknown user, skipping"
                    );
                    skipped += 1;
                    continue;
                }

                let result = HitResult::new(*id, *user_id, *x, *y, *r, *hit, *ts);
                state.ledger.restore(result);
            }
            WalOperation::ClearResults { user_id } => {
                state.ledger.restore_clear(*user_id);
            }
        }
    }

    info!(
        operations = operations.len(),
        skipped = skipped,
        users = state.user_store.len(),
        results = state.ledger.total_results(),
        "WAL operations applied"
    );

    Ok(())
}

/// Rewrite the WAL as the minimal log that rebuilds the current state
///
/// Each user is written as a registration followed by its current token,
/// then every surviving result in ID order. Superseded tokens and cleared
/// results are dropped. Returns the number of operations written.
pub fn compact_wal(state: &AppState) -> Result<usize> {
    let mut operations = Vec::new();

    for user in state.user_store.snapshot() {
        operations.push(WalOperation::Register {
            id: user.id,
            login: user.login,
            password_hash: user.password_hash,
        });

        if let (Some(token), Some(issued_at)) = (user.token, user.token_issued_at) {
            operations.push(WalOperation::IssueToken {
                user_id: user.id,
                token,
                issued_at,
            });
        }
    }

    for result in state.ledger.snapshot() {
        operations.push(WalOperation::RecordResult {
            id: result.id,
            user_id: result.user_id,
            x: result.x,
            y: result.y,
            r: result.r,
            hit: result.hit,
            ts: result.ts,
        });
    }

    state.wal.rewrite(&operations)?;

    info!(operations = operations.len(), "WAL compacted");

    Ok(operations.len())
}
