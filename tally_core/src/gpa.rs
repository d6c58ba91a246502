//! Credit-weighted GPA calculator.
//!
//! Each course row is normalized to a percentage, mapped to grade points
//! through a grading scale, and weighted by its credits.

use crate::store::{self, KvStore, GPA_KEY};
use crate::{Course, CourseField, Error, GradeBand, Result};
use once_cell::sync::Lazy;
use serde::Serialize;
use uuid::Uuid;

static DEFAULT_SCALE: Lazy<Vec<GradeBand>> = Lazy::new(|| {
    [
        (90.0, 10.0),
        (85.0, 9.0),
        (75.0, 8.0),
        (65.0, 7.0),
        (55.0, 6.0),
        (43.0, 5.0),
        (40.0, 4.0),
        (0.0, 0.0),
    ]
    .into_iter()
    .map(|(min, points)| GradeBand { min, points })
    .collect()
});

/// Ten-point grading scale, highest band first
pub fn default_grading_scale() -> Vec<GradeBand> {
    DEFAULT_SCALE.clone()
}

/// Grade points earned by a percentage
///
/// Uses the first band whose `min` the percentage reaches; bands must be
/// ordered highest first. Below every band earns 0.
pub fn grade_points(percent: f64, scale: &[GradeBand]) -> f64 {
    scale
        .iter()
        .find(|band| percent >= band.min)
        .map(|band| band.points)
        .unwrap_or(0.0)
}

/// Result of a GPA calculation
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct GpaSummary {
    pub gpa: f64,
    pub total_credits: f64,
}

/// Course rows; always holds at least one
#[derive(Clone, Debug, PartialEq)]
pub struct GpaBook {
    courses: Vec<Course>,
}

impl Default for GpaBook {
    fn default() -> Self {
        Self::new()
    }
}

impl GpaBook {
    pub fn new() -> Self {
        Self {
            courses: vec![Course::blank()],
        }
    }

    /// Build from stored rows, adding a blank row when there are none
    pub fn from_courses(courses: Vec<Course>) -> Self {
        if courses.is_empty() {
            Self::new()
        } else {
            Self { courses }
        }
    }

    pub fn load(store: &dyn KvStore) -> Result<Self> {
        let courses: Vec<Course> = store::load_or_default(store, GPA_KEY)?;
        Ok(Self::from_courses(courses))
    }

    /// Load rows, persisting the blank row if the store had none
    ///
    /// The seeded row's id must exist on disk so it can be edited later.
    pub fn open(store: &mut dyn KvStore) -> Result<Self> {
        let courses: Vec<Course> = store::load_or_default(&*store, GPA_KEY)?;
        let seeded = courses.is_empty();
        let book = Self::from_courses(courses);
        if seeded {
            book.save(store)?;
            tracing::debug!("Seeded blank course row {}", book.courses[0].id);
        }
        Ok(book)
    }

    pub fn save(&self, store: &mut dyn KvStore) -> Result<()> {
        store::save_json(store, GPA_KEY, &self.courses)
    }

    pub fn courses(&self) -> &[Course] {
        &self.courses
    }

    pub fn into_courses(self) -> Vec<Course> {
        self.courses
    }

    /// Append a blank row and return its id
    pub fn add_row(&mut self) -> Uuid {
        let course = Course::blank();
        let id = course.id;
        self.courses.push(course);
        id
    }

    /// Remove a row; the last remaining row cannot be removed
    pub fn remove_row(&mut self, id: Uuid) -> Result<()> {
        let idx = self.position(id)?;
        if self.courses.len() == 1 {
            return Err(Error::Validation("cannot remove the only course row".into()));
        }
        self.courses.remove(idx);
        Ok(())
    }

    /// Set one field of a row; non-finite values are stored as 0
    pub fn update_row(&mut self, id: Uuid, field: CourseField, value: f64) -> Result<()> {
        let idx = self.position(id)?;
        let value = if value.is_finite() { value } else { 0.0 };
        let course = &mut self.courses[idx];
        match field {
            CourseField::Credits => course.credits = value,
            CourseField::Max => course.max = value,
            CourseField::Obtained => course.obtained = value,
        }
        Ok(())
    }

    /// Drop every row and start over with one blank row
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Credit-weighted GPA
    ///
    /// Rows with zero max marks or zero credits do not count.
    pub fn calculate(&self, scale: &[GradeBand]) -> GpaSummary {
        let mut weighted_points = 0.0;
        let mut total_credits = 0.0;

        for course in &self.courses {
            if course.max == 0.0 || course.credits == 0.0 {
                continue;
            }
            let percent = course.obtained / course.max * 100.0;
            weighted_points += grade_points(percent, scale) * course.credits;
            total_credits += course.credits;
        }

        let gpa = if total_credits == 0.0 {
            0.0
        } else {
            weighted_points / total_credits
        };

        GpaSummary { gpa, total_credits }
    }

    /// Find a row by full id or by a unique id prefix
    pub fn resolve(&self, id_or_prefix: &str) -> Result<Uuid> {
        crate::tasks::resolve_prefix(self.courses.iter().map(|c| c.id), id_or_prefix, "course")
    }

    fn position(&self, id: Uuid) -> Result<usize> {
        self.courses
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| Error::NotFound(format!("course {}", id)))
    }
}
