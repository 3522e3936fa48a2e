use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::Serialize;

use crate::models::{
    day::{Day, DayLocation},
    place::Coordinates,
};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobePoint {
    pub trip_id: String,
    pub day_number: u32,
    pub date: NaiveDate,
    pub label: String,
    pub country: Option<String>,
    pub lat: f64,
    pub lng: f64,
    pub highlight: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GlobeData {
    pub points: Vec<GlobePoint>,
    pub visited_countries: Vec<String>,
    /// Mean of all points, used to aim the camera.
    pub center: Option<Coordinates>,
}

pub fn build(days: &[Day]) -> GlobeData {
    let mut points = Vec::new();
    let mut countries = BTreeSet::new();

    for day in days {
        for place in day.fields.location.places() {
            if let Some(country) = place.country.as_deref().map(str::trim) {
                if !country.is_empty() {
                    countries.insert(country.to_string());
                }
            }
        }

        // travel days are pinned where they ended
        let place = match &day.fields.location {
            DayLocation::Stay(place) => place,
            DayLocation::Travel { arriving, .. } => arriving,
        };
        let Some(coordinates) = place.coordinates() else {
            continue;
        };
        points.push(GlobePoint {
            trip_id: day.trip_id.clone(),
            day_number: day.day_number,
            date: day.date,
            label: place.name.clone().unwrap_or_else(|| format!("Day {}", day.day_number)),
            country: place.country.clone(),
            lat: coordinates.lat,
            lng: coordinates.lng,
            highlight: day.fields.highlight.clone(),
        });
    }

    let center = (!points.is_empty()).then(|| {
        let n = points.len() as f64;
        Coordinates::new(
            points.iter().map(|p| p.lat).sum::<f64>() / n,
            points.iter().map(|p| p.lng).sum::<f64>() / n,
        )
    });

    GlobeData {
        points,
        visited_countries: countries.into_iter().collect(),
        center,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{day::DayFields, place::Place};

    fn place(name: &str, country: &str, coords: Option<(f64, f64)>) -> Place {
        Place {
            name: Some(name.into()),
            country: Some(country.into()),
            lat: coords.map(|c| c.0),
            lng: coords.map(|c| c.1),
        }
    }

    fn day(number: u32, location: DayLocation) -> Day {
        Day {
            trip_id: "t".into(),
            day_number: number,
            date: NaiveDate::from_ymd_opt(2024, 3, number).unwrap(),
            fields: DayFields {
                location,
                ..DayFields::default()
            },
        }
    }

    #[test]
    fn pins_stays_and_arrivals_with_coordinates() {
        let days = vec![
            day(1, DayLocation::Stay(place("Lima", "Peru", Some((-12.0, -77.0))))),
            day(
                2,
                DayLocation::Travel {
                    leaving: place("Lima", "Peru", Some((-12.0, -77.0))),
                    arriving: place("La Paz", "Bolivia", Some((-16.0, -68.0))),
                },
            ),
            day(3, DayLocation::Stay(place("Unknown", "Chile", None))),
        ];

        let globe = build(&days);
        assert_eq!(globe.points.len(), 2);
        assert_eq!(globe.points[1].label, "La Paz");
        assert_eq!(
            globe.visited_countries,
            vec!["Bolivia".to_string(), "Chile".to_string(), "Peru".to_string()]
        );
        assert_eq!(globe.center, Some(Coordinates::new(-14.0, -72.5)));
    }

    #[test]
    fn empty_globe_has_no_center() {
        assert_eq!(build(&[]), GlobeData::default());
    }
}
