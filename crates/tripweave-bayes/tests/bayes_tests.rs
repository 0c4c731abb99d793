use std::collections::BTreeMap;

use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tripweave_bayes::{
    BayesError, BetaBelief, Category, PreferenceModel, WeatherClass, WeatherFeatures,
    naive_bayes_weather, predict_weather,
};

fn any_category() -> impl Strategy<Value = Category> {
    (0..Category::ALL.len()).prop_map(|i| Category::ALL[i])
}

fn any_features() -> impl Strategy<Value = WeatherFeatures> {
    (-10.0f64..50.0, 0.0f64..100.0, 980.0f64..1040.0, 0.0f64..100.0).prop_map(
        |(temp, humidity, pressure, clouds)| WeatherFeatures {
            temp,
            humidity,
            pressure,
            clouds,
        },
    )
}

proptest! {
    #[test]
    fn weather_posterior_sums_to_one(features in any_features()) {
        let posterior = naive_bayes_weather(&features);
        let sum = posterior.sunny + posterior.cloudy + posterior.rainy;
        prop_assert!((sum - 1.0).abs() < 1e-9);
        for class in WeatherClass::ALL {
            prop_assert!(posterior.get(class) > 0.0);
        }
    }

    #[test]
    fn liked_ratings_never_lower_the_mean(category in any_category(), ratings in prop::collection::vec(1u8..=5, 0..20), like in 4u8..=5) {
        let mut model = PreferenceModel::new();
        for rating in ratings {
            model.update_preference(category, rating);
        }
        let before = model.probability(category);
        let after = model.update_preference(category, like);
        prop_assert!(after >= before);
    }

    #[test]
    fn disliked_ratings_never_raise_the_mean(category in any_category(), dislike in 1u8..=3) {
        let mut model = PreferenceModel::new();
        let before = model.probability(category);
        let after = model.update_preference(category, dislike);
        prop_assert!(after <= before);
    }

    #[test]
    fn confidence_interval_contains_mean(alpha in 0.1f64..200.0, beta in 0.1f64..200.0) {
        let ci = BetaBelief::new(alpha, beta).expect("valid").confidence_interval();
        prop_assert!(0.0 <= ci.lower && ci.lower <= ci.mean);
        prop_assert!(ci.mean <= ci.upper && ci.upper <= 1.0);
    }

    #[test]
    fn dirichlet_probabilities_sum_to_one(counts in prop::collection::vec(0u64..50, 6)) {
        let model = PreferenceModel::new();
        let counts: BTreeMap<Category, u64> = Category::ALL.into_iter().zip(counts).collect();
        let probs = model.dirichlet_update(&counts);
        let sum: f64 = probs.values().sum();
        prop_assert!((sum - 1.0).abs() < 1e-9);
    }
}

#[test]
fn beliefs_survive_json_exactly() {
    let mut model = PreferenceModel::new();
    model.update_preference(Category::Cultural, 5);
    model.update_preference(Category::Nightlife, 2);

    let json = serde_json::to_string(model.beliefs()).expect("serialize");
    let parsed: BTreeMap<Category, BetaBelief> = serde_json::from_str(&json).expect("parse");

    let mut restored = PreferenceModel::new();
    assert_eq!(restored.restore_beliefs(parsed), 0);
    for category in Category::ALL {
        assert_eq!(restored.belief(category), model.belief(category));
    }
}

#[test]
fn categories_parse_case_insensitively() {
    assert_eq!("Cultural".parse::<Category>(), Ok(Category::Cultural));
    assert_eq!(
        "museums".parse::<Category>(),
        Err(BayesError::UnknownCategory {
            name: "museums".to_string()
        })
    );
}

#[test]
fn predicted_features_stay_in_simulated_ranges() {
    let mut rng = ChaCha8Rng::seed_from_u64(77);
    for _ in 0..100 {
        let prediction = predict_weather(&mut rng);
        let f = prediction.features;
        assert!((20.0..35.0).contains(&f.temp));
        assert!((40.0..80.0).contains(&f.humidity));
        assert!((1005.0..1020.0).contains(&f.pressure));
        assert!((10.0..90.0).contains(&f.clouds));
        assert_eq!(prediction.most_likely, prediction.predictions.most_likely());
    }
}

#[test]
fn prediction_json_uses_camel_case() {
    let mut rng = ChaCha8Rng::seed_from_u64(5);
    let json = serde_json::to_value(predict_weather(&mut rng)).expect("json");
    assert!(json["mostLikely"].is_string());
    assert!(json["predictions"]["rainy"].is_number());
    assert!(json["features"]["pressure"].is_number());
}

#[test]
fn liked_category_beats_disliked_one() {
    let mut model = PreferenceModel::new();
    for _ in 0..6 {
        model.update_preference(Category::Adventure, 5);
        model.update_preference(Category::Shopping, 1);
    }
    let mut rng = ChaCha8Rng::seed_from_u64(13);
    let p = model.compare_categories(Category::Adventure, Category::Shopping, 4_000, &mut rng);
    assert!(p > 0.95, "{p}");
    let above = model.probability_above(Category::Shopping, 0.5, 4_000, &mut rng);
    assert!(above < 0.05, "{above}");
}
