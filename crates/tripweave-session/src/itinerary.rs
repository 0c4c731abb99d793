use serde::{Deserialize, Serialize};
use tripweave_bayes::Category;

use crate::{Activity, Catalog, SessionError};

pub const MAX_ACTIVITIES_PER_DAY: usize = 3;
/// Longest trip accepted, in days.
pub const MAX_TRIP_DAYS: u32 = 365;
const FIRST_SLOT_HOUR: usize = 8;
const SLOT_HOURS: usize = 3;

/// What the traveller asked for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TripParams {
    pub destination: String,
    pub duration: u32,
    pub budget: f64,
    #[serde(default)]
    pub preferences: Vec<Category>,
}

impl TripParams {
    pub fn validate(&self) -> Result<(), SessionError> {
        if self.duration == 0 {
            return Err(SessionError::InvalidInput(
                "duration must be at least one day".to_string(),
            ));
        }
        if self.duration > MAX_TRIP_DAYS {
            return Err(SessionError::InvalidInput(format!(
                "duration must be at most {MAX_TRIP_DAYS} days, got {}",
                self.duration
            )));
        }
        if !self.budget.is_finite() || self.budget < 0.0 {
            return Err(SessionError::InvalidInput(format!(
                "budget must be a finite non-negative amount, got {}",
                self.budget
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledActivity {
    pub id: String,
    /// Start time such as `"11:00"`.
    pub time: String,
    #[serde(flatten)]
    pub activity: Activity,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DayPlan {
    pub day: u32,
    pub city: String,
    pub activities: Vec<ScheduledActivity>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Itinerary {
    pub days: Vec<DayPlan>,
    pub total_cost: f64,
}

impl Itinerary {
    pub fn activities(&self) -> impl Iterator<Item = &ScheduledActivity> {
        self.days.iter().flat_map(|day| day.activities.iter())
    }

    /// Sum of activity costs, recomputed from the days.
    pub fn computed_cost(&self) -> f64 {
        self.activities().map(|scheduled| scheduled.activity.cost).sum()
    }
}

/// Pick up to three activities for one day.
///
/// Without a cultural or adventure preference the first three are taken.
/// A cultural preference keeps the first two cultural activities; an
/// adventure preference then appends the first adventure activity.
pub fn select_activities(activities: &[Activity], preferences: &[Category]) -> Vec<Activity> {
    let first_of = |category: Category, n: usize| {
        activities
            .iter()
            .filter(|a| a.category == category)
            .take(n)
            .cloned()
            .collect::<Vec<_>>()
    };

    let mut selected: Vec<Activity> = if preferences.contains(&Category::Cultural) {
        first_of(Category::Cultural, 2)
    } else {
        activities.iter().take(MAX_ACTIVITIES_PER_DAY).cloned().collect()
    };
    if preferences.contains(&Category::Adventure) {
        selected.extend(first_of(Category::Adventure, 1));
    }
    selected.truncate(MAX_ACTIVITIES_PER_DAY);
    selected
}

/// Index of the city visited on `day` when `duration` days are split evenly
/// over `city_count` cities.
pub fn city_index(day: u32, duration: u32, city_count: usize) -> usize {
    if city_count == 0 || duration == 0 {
        return 0;
    }
    let days_per_city = f64::from(duration) / city_count as f64;
    let index = (f64::from(day.saturating_sub(1)) / days_per_city).floor() as usize;
    index.min(city_count - 1)
}

/// Build a day-by-day plan from the catalog.
///
/// Unknown destinations use the default city every day. Cities with no
/// activities borrow the default city's list but keep their own name.
pub fn assemble(catalog: &Catalog, params: &TripParams) -> Result<Itinerary, SessionError> {
    params.validate()?;

    let cities: Vec<&str> = match catalog.cities(&params.destination) {
        Some(cities) => cities.iter().map(|c| c.name.as_str()).collect(),
        None => {
            tracing::warn!(
                target: "tripweave::itinerary",
                destination = %params.destination,
                fallback = %catalog.default_city,
                "destination missing from catalog, using default city"
            );
            vec![catalog.default_city.as_str()]
        }
    };

    let mut days = Vec::with_capacity(params.duration as usize);
    for day in 1..=params.duration {
        let city = cities[city_index(day, params.duration, cities.len())];
        let activities = match catalog.activities_for(city) {
            Some(activities) => activities,
            None => {
                tracing::warn!(
                    target: "tripweave::itinerary",
                    city,
                    fallback = %catalog.default_city,
                    "city has no activities, borrowing default city's"
                );
                catalog.default_activities()
            }
        };

        let scheduled = select_activities(activities, &params.preferences)
            .into_iter()
            .enumerate()
            .map(|(idx, activity)| ScheduledActivity {
                id: format!("d{day}-a{idx}"),
                time: format!("{}:00", FIRST_SLOT_HOUR + idx * SLOT_HOURS),
                activity,
            })
            .collect();

        days.push(DayPlan {
            day,
            city: city.to_string(),
            activities: scheduled,
        });
    }

    let mut itinerary = Itinerary {
        days,
        total_cost: 0.0,
    };
    itinerary.total_cost = itinerary.computed_cost();
    Ok(itinerary)
}
