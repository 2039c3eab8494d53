//! Derived metrics
//!
//! Pure functions computing resting and daily energy figures from the
//! user profile.

use crate::store::models::{ActivityLevel, Gender, UserProfile};

/// Basal metabolic rate via the Mifflin-St Jeor equation.
/// Men: 10W + 6.25H - 5A + 5, women: 10W + 6.25H - 5A - 161.
/// The "other" gender currently collapses to the female constant.
pub fn basal_metabolic_rate(user: &UserProfile) -> f64 {
    let sex_constant = match user.gender {
        Gender::Male => 5.0,
        Gender::Female | Gender::Other => -161.0,
    };
    10.0 * user.weight_kg + 6.25 * user.height_cm - 5.0 * f64::from(user.age) + sex_constant
}

fn activity_multiplier(level: ActivityLevel) -> f64 {
    match level {
        ActivityLevel::Sedentary => 1.2,
        ActivityLevel::Light => 1.375,
        ActivityLevel::Moderate => 1.55,
        ActivityLevel::Active => 1.725,
        ActivityLevel::Athlete => 1.9,
    }
}

/// Total daily energy expenditure, rounded to the nearest whole calorie.
/// An unset activity level deserializes to Moderate, so the moderate
/// multiplier is the effective default.
pub fn daily_energy_target(user: &UserProfile) -> i64 {
    (basal_metabolic_rate(user) * activity_multiplier(user.activity_level)).round() as i64
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(weight: f64, height: f64, age: u32, gender: Gender) -> UserProfile {
        UserProfile {
            weight_kg: weight,
            height_cm: height,
            age,
            gender,
            ..UserProfile::default()
        }
    }

    #[test]
    fn bmr_reference_values() {
        // 10*70 + 6.25*175 - 5*30 + 5 = 1648.75
        let user = profile(70.0, 175.0, 30, Gender::Male);
        assert_eq!(basal_metabolic_rate(&user), 1648.75);

        let user = profile(70.0, 175.0, 30, Gender::Female);
        assert_eq!(basal_metabolic_rate(&user), 1482.75);
    }

    #[test]
    fn other_gender_uses_female_constant() {
        let female = profile(70.0, 175.0, 30, Gender::Female);
        let other = profile(70.0, 175.0, 30, Gender::Other);
        assert_eq!(basal_metabolic_rate(&other), basal_metabolic_rate(&female));
    }

    #[test]
    fn tdee_rounds_to_whole_calories() {
        let mut user = profile(70.0, 175.0, 30, Gender::Male);
        user.activity_level = ActivityLevel::Moderate;
        // round(1648.75 * 1.55) = round(2555.5625) = 2556
        assert_eq!(daily_energy_target(&user), 2556);

        user.activity_level = ActivityLevel::Sedentary;
        assert_eq!(daily_energy_target(&user), 1979);

        user.activity_level = ActivityLevel::Athlete;
        assert_eq!(daily_energy_target(&user), 3133);
    }

    #[test]
    fn target_is_deterministic() {
        let user = profile(82.0, 181.0, 41, Gender::Male);
        assert_eq!(daily_energy_target(&user), daily_energy_target(&user));
    }
}
