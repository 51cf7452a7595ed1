use rand::Rng;

/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Human-facing order number: `ORD-<epoch millis>-<0..=9999>`
///
/// Not unique on its own; the `orders.order_number` UNIQUE constraint is the
/// authority and callers retry on collision.
pub fn order_number() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..=9999);
    format!("ORD-{}-{}", now_millis(), suffix)
}

/// Transaction id issued by the simulated gateway: `trx-<epoch millis>-<0..=999>`
pub fn transaction_id() -> String {
    let suffix: u16 = rand::thread_rng().gen_range(0..=999);
    format!("trx-{}-{}", now_millis(), suffix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_order_number_format() {
        let n = order_number();
        let parts: Vec<&str> = n.split('-').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "ORD");
        assert!(parts[1].parse::<i64>().is_ok());
        assert!(parts[2].parse::<u16>().unwrap() <= 9999);
    }

    #[test]
    fn test_transaction_id_format() {
        let t = transaction_id();
        assert!(t.starts_with("trx-"));
        let suffix: u16 = t.rsplit('-').next().unwrap().parse().unwrap();
        assert!(suffix <= 999);
    }
}
