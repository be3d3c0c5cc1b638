use alloy_primitives::U256;
use depot_bls::PublicKey;

/// 0.01 ETH, in wei: what the node wallet must hold per key it asks to register.
pub const VALIDATOR_DEPOSIT_COST: U256 = U256::from_limbs([10_000_000_000_000_000, 0, 0, 0]);

/// Splits `unregistered` into the keys the node `balance` can pay for and those it can't.
///
/// Keys already `pending` registration are paid for first. Returns
/// `(registerable, remaining, remaining_balance)`.
pub fn get_registerable_keys(
    pending: &[PublicKey],
    unregistered: &[PublicKey],
    balance: U256,
) -> (Vec<PublicKey>, Vec<PublicKey>, U256) {
    let cost = VALIDATOR_DEPOSIT_COST;
    let mut remaining_balance =
        balance.saturating_sub(cost.saturating_mul(U256::from(pending.len())));

    let mut registerable = vec![];
    let mut remaining = vec![];
    for public_key in unregistered {
        if remaining_balance >= cost {
            remaining_balance -= cost;
            registerable.push(public_key.clone());
        } else {
            remaining.push(public_key.clone());
        }
    }

    (registerable, remaining, remaining_balance)
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::*;

    fn public_key(tag: u8) -> PublicKey {
        PublicKey::from_str(&format!("0xbeac09{tag:02x}{}", "bb".repeat(44))).unwrap()
    }

    fn one_and_a_half_deposits() -> U256 {
        VALIDATOR_DEPOSIT_COST * U256::from(3) / U256::from(2)
    }

    #[test]
    fn test_three_keys_one_affordable() {
        let keys = [public_key(0), public_key(1), public_key(2)];

        let (registerable, remaining, remaining_balance) =
            get_registerable_keys(&[], &keys, one_and_a_half_deposits());
        assert_eq!(registerable, vec![keys[0].clone()]);
        assert_eq!(remaining, vec![keys[1].clone(), keys[2].clone()]);
        assert_eq!(remaining_balance, VALIDATOR_DEPOSIT_COST / U256::from(2));
    }

    #[test]
    fn test_single_key() {
        let keys = [public_key(0)];

        let (registerable, remaining, remaining_balance) =
            get_registerable_keys(&[], &keys, one_and_a_half_deposits());
        assert_eq!(registerable.len(), 1);
        assert!(remaining.is_empty());
        assert_eq!(remaining_balance, VALIDATOR_DEPOSIT_COST / U256::from(2));
    }

    #[test]
    fn test_pending_keys_reserve_balance_first() {
        let pending = [public_key(0)];
        let keys = [public_key(1), public_key(2)];

        let (registerable, remaining, remaining_balance) =
            get_registerable_keys(&pending, &keys, one_and_a_half_deposits());
        assert!(registerable.is_empty());
        assert_eq!(remaining, vec![keys[0].clone(), keys[1].clone()]);
        assert_eq!(remaining_balance, VALIDATOR_DEPOSIT_COST / U256::from(2));
    }

    #[test]
    fn test_pending_keys_exceeding_balance() {
        let pending = [public_key(0), public_key(1)];

        let (registerable, _, remaining_balance) =
            get_registerable_keys(&pending, &[public_key(2)], VALIDATOR_DEPOSIT_COST);
        assert!(registerable.is_empty());
        assert_eq!(remaining_balance, U256::ZERO);
    }
}
