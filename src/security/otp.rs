/// One-time passcodes
use rand::Rng;

pub const OTP_MIN: u32 = 1000;
pub const OTP_MAX: u32 = 9999;

/// Draw a uniformly random 4-digit code. The generator is a parameter so
/// flows use `thread_rng` and tests a seeded one.
pub fn generate_code<R: Rng>(rng: &mut R) -> u32 {
    rng.gen_range(OTP_MIN..=OTP_MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn codes_stay_in_range() {
        let mut rng = rand::thread_rng();
        for _ in 0..10_000 {
            let code = generate_code(&mut rng);
            assert!((OTP_MIN..=OTP_MAX).contains(&code));
        }
    }

    #[test]
    fn seeded_generator_is_deterministic() {
        let a = generate_code(&mut StdRng::seed_from_u64(42));
        let b = generate_code(&mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }
}
