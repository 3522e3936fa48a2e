use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::Datelike;
use serde::Serialize;

use crate::{
    journal::hashtags,
    models::{day::Day, trip::Trip},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TagCount {
    pub tag: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct YearCount {
    pub year: i32,
    pub count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TravelStats {
    pub total_trips: usize,
    pub total_days: usize,
    pub total_locations: usize,
    pub total_countries: usize,
    pub most_visited: Option<String>,
    pub trip_type_counts: Vec<TagCount>,
    pub hashtag_counts: Vec<TagCount>,
    pub trips_per_year: Vec<YearCount>,
    pub days_per_year: Vec<YearCount>,
}

impl TravelStats {
    pub fn most_visited_text(&self) -> &str {
        self.most_visited.as_deref().unwrap_or("N/A")
    }
}

pub fn compute(trips: &[Trip], days: &[Day]) -> TravelStats {
    let mut place_counts: HashMap<&str, usize> = HashMap::new();
    let mut countries: BTreeSet<&str> = BTreeSet::new();
    let mut hashtag_counts: HashMap<&str, usize> = HashMap::new();
    let mut days_per_year: BTreeMap<i32, usize> = BTreeMap::new();

    for day in days {
        let destination = day.fields.location.destination();
        if let Some(name) = non_blank(destination.name.as_deref()) {
            *place_counts.entry(name).or_default() += 1;
        }
        if let Some(country) = non_blank(destination.country.as_deref()) {
            countries.insert(country);
        }
        if let Some(text) = day.fields.notable_things.as_deref() {
            for tag in hashtags::extract(text) {
                *hashtag_counts.entry(tag).or_default() += 1;
            }
        }
        *days_per_year.entry(day.date.year()).or_default() += 1;
    }

    let mut trip_type_counts: HashMap<&str, usize> = HashMap::new();
    let mut trips_per_year: BTreeMap<i32, usize> = BTreeMap::new();
    for trip in trips {
        for tag in &trip.trip_type {
            *trip_type_counts.entry(tag.as_str()).or_default() += 1;
        }
        *trips_per_year.entry(trip.start_date.year()).or_default() += 1;
    }

    let most_visited = ranked(&place_counts).into_iter().next().map(|top| top.tag);

    TravelStats {
        total_trips: trips.len(),
        total_days: days.len(),
        total_locations: place_counts.len(),
        total_countries: countries.len(),
        most_visited,
        trip_type_counts: ranked(&trip_type_counts),
        hashtag_counts: ranked(&hashtag_counts),
        trips_per_year: per_year(trips_per_year),
        days_per_year: per_year(days_per_year),
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Highest count first, ties by name.
fn ranked(counts: &HashMap<&str, usize>) -> Vec<TagCount> {
    let mut ranked: Vec<TagCount> = counts
        .iter()
        .map(|(tag, count)| TagCount {
            tag: (*tag).to_string(),
            count: *count,
        })
        .collect();
    ranked.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.tag.cmp(&b.tag)));
    ranked
}

fn per_year(counts: BTreeMap<i32, usize>) -> Vec<YearCount> {
    counts
        .into_iter()
        .map(|(year, count)| YearCount { year, count })
        .collect()
}
