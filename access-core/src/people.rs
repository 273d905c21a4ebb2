//! Resident dataset and its grid-bucketed spatial index.
//!
//! Grounded on `original_source/backend/people.h`/`people.cpp` for the
//! `Person`/`MeterCoord` field shapes, but *not* on that file's
//! Hilbert-curve `findPeople` index: a grid/constrained-enumeration
//! design is used instead, since the Hilbert index is an older
//! approach superseded here.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::coords::{div_floor, MeterCoord};

/// Residents' home coordinates lie on a 100m grid offset by +50m in
/// both axes; this is the grid `PeopleIndex` buckets on.
pub const GRID_STEP: i32 = 100;
pub const GRID_OFFSET: i32 = 50;

pub type CountyCode = u16;
pub type MunicipalityCode = u16;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Person {
    pub is_female: bool,
    pub work_county: CountyCode,
    pub work_municipality: MunicipalityCode,
    pub work_coord: MeterCoord,
    pub home_county: CountyCode,
    pub home_municipality: MunicipalityCode,
    pub home_coord: MeterCoord,
}

/// `peopleByHomeCell`, populated once on load.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct PeopleIndex {
    by_home_cell: HashMap<MeterCoord, Vec<Person>>,
}

impl PeopleIndex {
    pub fn new() -> PeopleIndex {
        PeopleIndex::default()
    }

    /// Inserts `person` under the grid cell of their home coordinate.
    pub fn insert(&mut self, person: Person) {
        let cell = person.home_coord.grid_cell(GRID_STEP, GRID_OFFSET);
        self.by_home_cell.entry(cell).or_default().push(person);
    }

    pub fn cell(&self, cell: MeterCoord) -> &[Person] {
        self.by_home_cell.get(&cell).map(Vec::as_slice).unwrap_or(&[])
    }

    /// `personsInCircle(origin, r)`: flatten `peopleByHomeCell[c]` for
    /// `c ∈ circleCells(origin, r, 100, 50)`.
    pub fn persons_in_circle(&self, origin: MeterCoord, r: i32) -> Vec<&Person> {
        circle_cells(origin, r, GRID_STEP, GRID_OFFSET)
            .into_iter()
            .flat_map(|c| self.cell(c))
            .collect()
    }

    /// Distinct populated home cells within the circle, used by the
    /// Evaluator to avoid re-querying Prox per resident.
    pub fn populated_cells_in_circle(&self, origin: MeterCoord, r: i32) -> Vec<MeterCoord> {
        circle_cells(origin, r, GRID_STEP, GRID_OFFSET)
            .into_iter()
            .filter(|c| !self.cell(*c).is_empty())
            .collect()
    }
}

/// Every grid cell (aligned to `offset` mod `step`) in the axis-aligned
/// box `[origin.x±dx, origin.y±dy]`.
pub fn square_cells(origin: MeterCoord, dx: i32, dy: i32, step: i32, offset: i32) -> Vec<MeterCoord> {
    let (min_x, max_x) = (origin.x - dx, origin.x + dx);
    let (min_y, max_y) = (origin.y - dy, origin.y + dy);
    let start_x = div_floor(min_x - offset, step) * step + offset;
    let start_y = div_floor(min_y - offset, step) * step + offset;

    let mut cells = Vec::new();
    let mut x = start_x;
    while x <= max_x {
        let mut y = start_y;
        while y <= max_y {
            cells.push(MeterCoord::new(x, y));
            y += step;
        }
        x += step;
    }
    cells
}

/// `squareCells` filtered to those actually within `r` of `origin`.
pub fn circle_cells(origin: MeterCoord, r: i32, step: i32, offset: i32) -> Vec<MeterCoord> {
    square_cells(origin, r, r, step, offset)
        .into_iter()
        .filter(|c| origin.distance_to_leq(*c, r))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn person_at(home: MeterCoord) -> Person {
        Person {
            is_female: false,
            work_county: 0,
            work_municipality: 0,
            work_coord: MeterCoord::new(0, 0),
            home_county: 0,
            home_municipality: 0,
            home_coord: home,
        }
    }

    /// A circle around the origin picks up the
    /// four cells within 150m and excludes the corner cell.
    #[test]
    fn persons_in_circle_matches_naive_scan() {
        let homes = [
            MeterCoord::new(50, 50),
            MeterCoord::new(50, 150),
            MeterCoord::new(150, 50),
            MeterCoord::new(150, 150),
            MeterCoord::new(-50, 50),
        ];
        let mut index = PeopleIndex::new();
        for h in homes {
            index.insert(person_at(h));
        }

        let origin = MeterCoord::new(0, 0);
        let found: Vec<MeterCoord> = index.persons_in_circle(origin, 150).iter().map(|p| p.home_coord).collect();

        let naive: Vec<MeterCoord> = homes.iter().copied().filter(|h| origin.distance_to_leq(*h, 150)).collect();

        let mut found_sorted = found.clone();
        found_sorted.sort();
        let mut naive_sorted = naive.clone();
        naive_sorted.sort();
        assert_eq!(found_sorted, naive_sorted);
        assert!(!found.contains(&MeterCoord::new(150, 150)));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn square_cells_respects_offset_grid() {
        let cells = square_cells(MeterCoord::new(0, 0), 60, 60, 100, 50);
        assert!(cells.iter().all(|c| (c.x - 50) % 100 == 0 && (c.y - 50) % 100 == 0));
        assert!(cells.contains(&MeterCoord::new(-50, -50)));
        assert!(cells.contains(&MeterCoord::new(50, 50)));
    }
}
