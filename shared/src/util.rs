use std::sync::atomic::{AtomicI64, Ordering};

/// 获取当前 UTC 时间戳（毫秒）
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

static LAST_ID: AtomicI64 = AtomicI64::new(0);

/// Generate a time-ordered i64 for use as a line-item id.
///
/// Layout (53 bits, fits in JavaScript's Number.MAX_SAFE_INTEGER):
///   - 41 bits: milliseconds since 2024-01-01 UTC (~69 years)
///   - 12 bits: random
///
/// Ids are strictly increasing within a process (same-millisecond ids are
/// bumped past the previous one), so a batch of line items created together
/// sorts in creation order. The payer rule depends on this: the line item
/// with the lowest numeric id prefix is the earliest created.
pub fn ordered_id() -> i64 {
    use rand::Rng;
    // Custom epoch: 2024-01-01 00:00:00 UTC
    const EPOCH_MS: i64 = 1_704_067_200_000;
    loop {
        let ts = (now_millis() - EPOCH_MS) & 0x1FF_FFFF_FFFF; // 41 bits
        let rand_bits: i64 = rand::thread_rng().gen_range(0..0x1000); // 12 bits
        let candidate = (ts << 12) | rand_bits;

        let last = LAST_ID.load(Ordering::Relaxed);
        let id = candidate.max(last + 1);
        if LAST_ID
            .compare_exchange(last, id, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            return id;
        }
    }
}

/// Creation order of a line-item id: its numeric prefix.
///
/// Ids are `"<ordered_id>"`, optionally followed by a `-suffix`. Ids with no
/// numeric prefix sort last, so a malformed id can never claim the payer role.
pub fn creation_order(id: &str) -> i64 {
    let digits: &str = id
        .split_once(|c: char| !c.is_ascii_digit())
        .map(|(head, _)| head)
        .unwrap_or(id);
    digits.parse().unwrap_or(i64::MAX)
}
