use anyhow::{anyhow, bail, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// WAL operation types
#[derive(Debug, Clone, PartialEq)]
pub enum WalOperation {
    Register {
        id: u64,
        login: String,
        password_hash: String,
    },
    IssueToken {
        user_id: u64,
        token: String,
        issued_at: i64,
    },
    RecordResult {
        id: u64,
        user_id: u64,
        x: f64,
        y: f64,
        r: i32,
        hit: bool,
        ts: i64,
    },
    ClearResults {
        user_id: u64,
    },
}

impl WalOperation {
    // Free-text fields are hex-encoded so they can never contain the separator
    fn to_line(&self) -> String {
        match self {
            WalOperation::Register {
                id,
                login,
                password_hash,
            } => format!(
                "REGISTER|{}|{}|{}",
                id,
                hex::encode(login),
                hex::encode(password_hash)
            ),
            WalOperation::IssueToken {
                user_id,
                token,
                issued_at,
            } => format!("TOKEN|{}|{}|{}", user_id, token, issued_at),
            WalOperation::RecordResult {
                id,
                user_id,
                x,
                y,
                r,
                hit,
                ts,
            } => {
                let hit_flag = if *hit { "1" } else { "0" };
                format!(
                    "RESULT|{}|{}|{}|{}|{}|{}|{}",
                    id, user_id, x, y, r, hit_flag, ts
                )
            }
            WalOperation::ClearResults { user_id } => format!("CLEAR|{}", user_id),
        }
    }

    fn from_line(line: &str) -> Result<Self> {
        let parts: Vec<&str> = line.split('|').collect();

        match parts.first() {
            Some(&"REGISTER") => {
                if parts.len() != 4 {
                    bail!("Invalid REGISTER format");
                }
                let id = parts[1].parse::<u64>().context("Invalid user ID")?;
                let login = decode_text(parts[2]).context("Invalid login")?;
                let password_hash = decode_text(parts[3]).context("Invalid password hash")?;

                Ok(WalOperation::Register {
                    id,
                    login,
                    password_hash,
                })
            }
            Some(&"TOKEN") => {
                if parts.len() != 4 {
                    bail!("Invalid TOKEN format");
                }
                let user_id = parts[1].parse::<u64>().context("Invalid user ID")?;
                let token = parts[2];
                if token.is_empty() || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
                    bail!("Token must be non-empty hex");
                }
                let issued_at = parts[3].parse::<i64>().context("Invalid issue time")?;

                Ok(WalOperation::IssueToken {
                    user_id,
                    token: token.to_string(),
                    issued_at,
                })
            }
            Some(&"RESULT") => {
                if parts.len() != 8 {
                    bail!("Invalid RESULT format");
                }
                let id = parts[1].parse::<u64>().context("Invalid result ID")?;
                let user_id = parts[2].parse::<u64>().context("Invalid user ID")?;
                let x = parts[3].parse::<f64>().context("Invalid x")?;
                let y = parts[4].parse::<f64>().context("Invalid y")?;
                let r = parts[5].parse::<i32>().context("Invalid r")?;
                let hit = match parts[6] {
                    "1" => true,
                    "0" => false,
                    other => bail!("Invalid hit flag '{}'", other),
                };
                let ts = parts[7].parse::<i64>().context("Invalid timestamp")?;

                Ok(WalOperation::RecordResult {
                    id,
                    user_id,
                    x,
                    y,
                    r,
                    hit,
                    ts,
                })
            }
            Some(&"CLEAR") => {
                if parts.len() != 2 {
                    bail!("Invalid CLEAR format");
                }
                let user_id = parts[1].parse::<u64>().context("Invalid user ID")?;

                Ok(WalOperation::ClearResults { user_id })
            }
            _ => bail!("Unknown operation type"),
        }
    }
}

fn decode_text(field: &str) -> Result<String> {
    let bytes = hex::decode(field).context("Invalid hex")?;
    String::from_utf8(bytes).context("Invalid UTF-8")
}

/// Append-only journal of store mutations
pub struct Wal {
    file: Arc<Mutex<File>>,
    path: PathBuf,
}

impl Wal {
    pub fn new(path: PathBuf) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .context("Failed to open WAL file")?;

        Ok(Wal {
            file: Arc::new(Mutex::new(file)),
            path,
        })
    }

    pub fn log_operation(&self, op: WalOperation) -> Result<()> {
        let line = op.to_line();
        let mut file = self.file.lock().map_err(|_| anyhow!("WAL lock poisoned"))?;
        writeln!(file, "{}", line).context("Failed to write to WAL")?;
        file.flush().context("Failed to flush WAL")?;
        Ok(())
    }

    pub fn replay(&self) -> Result<Vec<WalOperation>> {
        let file = File::open(&self.path).context("Failed to open WAL for replay")?;
        let reader = BufReader::new(file);
        let mut operations = Vec::new();

        for (line_num, line_result) in reader.lines().enumerate() {
            let line = line_result.context("Failed to read line from WAL")?;
            let line = line.trim();

            if line.is_empty() {
                continue;
            }

            match WalOperation::from_line(line) {
                Ok(op) => operations.push(op),
                Err(e) => {
                    tracing::warn!(
                        line_num = line_num + 1,
                        error = %e,
                        "Failed to parse WAL line, skipping"
                    );
                }
            }
        }

        Ok(operations)
    }

    /// Replace the journal with `operations`
    ///
    /// The new contents are written to a sibling file and renamed over the
    /// journal, so a crash leaves either the old or the new log intact.
    pub fn rewrite(&self, operations: &[WalOperation]) -> Result<()> {
        let mut file = self.file.lock().map_err(|_| anyhow!("WAL lock poisoned"))?;

        let mut tmp_path = self.path.clone().into_os_string();
        tmp_path.push(".tmp");
        let tmp_path = PathBuf::from(tmp_path);

        let tmp_file = File::create(&tmp_path).context("Failed to create WAL snapshot")?;
        let mut writer = BufWriter::new(tmp_file);
        for op in operations {
            writeln!(writer, "{}", op.to_line()).context("Failed to write WAL snapshot")?;
        }
        let snapshot = writer
            .into_inner()
            .map_err(|e| anyhow!("Failed to flush WAL snapshot: {}", e.error()))?;
        snapshot.sync_all().context("Failed to sync WAL snapshot")?;

        fs::rename(&tmp_path, &self.path).context("Failed to replace WAL with snapshot")?;

        *file = OpenOptions::new()
            .append(true)
            .open(&self.path)
            .context("Failed to reopen WAL")?;

        Ok(())
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}
