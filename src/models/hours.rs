use serde::{Deserialize, Serialize};

/// Daily opening window of a facility, `HH:MM` in venue-local time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenHours {
    pub open: String,
    pub close: String,
}

impl Default for OpenHours {
    fn default() -> Self {
        Self {
            open: "06:00".to_string(),
            close: "22:00".to_string(),
        }
    }
}

impl OpenHours {
    pub fn validate(&self) -> anyhow::Result<()> {
        let open = parse_time(&self.open)?;
        let close = parse_time(&self.close)?;
        if open >= close {
            return Err(anyhow::anyhow!(
                "opening time {} must be before closing time {}",
                self.open,
                self.close
            ));
        }
        Ok(())
    }
}

/// Minutes since midnight for an `HH:MM` string.
fn parse_time(s: &str) -> anyhow::Result<u32> {
    let (h, m) = s
        .split_once(':')
        .ok_or_else(|| anyhow::anyhow!("invalid time format: {s}"))?;
    let hour: u32 = h
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid hour in: {s}"))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| anyhow::anyhow!("invalid minute in: {s}"))?;
    if hour > 23 || minute > 59 {
        return Err(anyhow::anyhow!("time out of range: {s}"));
    }
    Ok(hour * 60 + minute)
}
