//! Chronologically sortable document keys, in the format the realtime store
//! generates for appended children: 8 characters of millisecond timestamp
//! followed by 12 random characters, all drawn from an alphabet whose byte
//! order matches its sort order.

use rand::Rng;

const PUSH_CHARS: &[u8; 64] = b"-0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ_abcdefghijklmnopqrstuvwxyz";

/// Generates push keys. Keys minted within the same millisecond stay
/// ordered by incrementing the random suffix.
#[derive(Debug, Default)]
pub struct PushIdGenerator {
    last_millis: i64,
    last_random: [u8; 12],
}

impl PushIdGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id<R: Rng>(&mut self, now_millis: i64, rng: &mut R) -> String {
        if now_millis == self.last_millis {
            increment(&mut self.last_random);
        } else {
            self.last_millis = now_millis;
            for slot in self.last_random.iter_mut() {
                *slot = rng.gen_range(0..64);
            }
        }

        let mut id = [0u8; 20];
        let mut t = now_millis.max(0);
        for slot in id[..8].iter_mut().rev() {
            *slot = PUSH_CHARS[(t % 64) as usize];
            t /= 64;
        }
        for (slot, digit) in id[8..].iter_mut().zip(self.last_random.iter()) {
            *slot = PUSH_CHARS[*digit as usize];
        }
        id.iter().map(|b| *b as char).collect()
    }
}

/// Base-64 increment with carry; wraps silently after 64^12 keys per ms.
fn increment(digits: &mut [u8; 12]) {
    for digit in digits.iter_mut().rev() {
        if *digit == 63 {
            *digit = 0;
        } else {
            *digit += 1;
            return;
        }
    }
}
