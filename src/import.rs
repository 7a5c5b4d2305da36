//! Tabular master-data import.
//!
//! Reads the product catalogue and the worker roster from CSV. Both files
//! share one [`SkillCatalog`]: every column that is not a known field is a
//! skill dimension and is interned by its header.
//!
//! # Product catalogue
//!
//! | Column | Required | Meaning |
//! |--------|----------|---------|
//! | `product` | yes | Product name; rows of one product are grouped |
//! | `sequence` | no | Authored position (row order when empty) |
//! | `task` | no | Task name (defaults to the output code) |
//! | `output_code` | yes | Output code, unique within the product |
//! | `requires` | no | Comma-separated output codes of the same product |
//! | `duration_seconds` | yes | Converted to whole slots, at least one |
//! | *other* | no | Skill weight 0–100, `%` allowed, empty = 0 |
//!
//! # Worker roster
//!
//! | Column | Required | Meaning |
//! |--------|----------|---------|
//! | `id` | yes | Worker id |
//! | `name` | no | Display name (defaults to the id) |
//! | `preference` | no | `fixed`, `flow`, or a flow affinity 0–1 |
//! | `start_time` | no | `HH:MM` |
//! | `favorites` | no | `;`-separated products, most preferred first |
//! | `selected` | no | `true/false/yes/no/1/0`, empty = true |
//! | *other* | no | Skill level in the given [`SkillScale`] |

use std::collections::HashMap;
use std::io::Read;
use std::path::Path;

use csv::{ReaderBuilder, StringRecord};
use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::ImportError;
use crate::models::{
    Product, ProductCatalog, RolePreference, SkillCatalog, SkillId, SkillScale, TaskDefinition,
    Worker,
};
use crate::store::MasterData;

const PRODUCT_FIELDS: [&str; 6] = [
    "product",
    "sequence",
    "task",
    "output_code",
    "requires",
    "duration_seconds",
];

const WORKER_FIELDS: [&str; 6] = ["id", "name", "preference", "start_time", "favorites", "selected"];

/// Affinity at or above which a numeric preference counts as flow.
const FLOW_AFFINITY_CUTOFF: f64 = 0.5;

/// Header index of one file.
struct Columns {
    index: HashMap<String, usize>,
    skills: Vec<(usize, SkillId)>,
}

impl Columns {
    fn new(headers: &StringRecord, fields: &[&str], skills: &mut SkillCatalog) -> Self {
        let mut index = HashMap::new();
        let mut skill_columns = Vec::new();
        for (i, header) in headers.iter().enumerate() {
            let key = header.trim().to_ascii_lowercase();
            if key.is_empty() {
                continue;
            }
            if fields.contains(&key.as_str()) {
                index.insert(key, i);
            } else {
                skill_columns.push((i, skills.intern(header.trim())));
            }
        }
        Self {
            index,
            skills: skill_columns,
        }
    }

    fn required(&self, name: &'static str) -> Result<usize, ImportError> {
        self.index
            .get(name)
            .copied()
            .ok_or(ImportError::MissingColumn(name))
    }

    fn optional(&self, name: &str) -> Option<usize> {
        self.index.get(name).copied()
    }
}

fn get_string_field(record: &StringRecord, index: Option<usize>) -> Option<String> {
    index
        .and_then(|i| record.get(i))
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn invalid(row: usize, column: &str, message: impl Into<String>) -> ImportError {
    ImportError::InvalidValue {
        row,
        column: column.to_string(),
        message: message.into(),
    }
}

/// Parses a skill cell: empty reads 0, a trailing `%` is ignored.
fn parse_skill(raw: &str, row: usize, column: &str) -> Result<f64, ImportError> {
    let text = raw.trim().trim_end_matches('%').trim();
    if text.is_empty() {
        return Ok(0.0);
    }
    let value: f64 = text
        .parse()
        .map_err(|_| invalid(row, column, format!("'{raw}' is not a number")))?;
    if !value.is_finite() || value < 0.0 {
        return Err(invalid(row, column, format!("'{raw}' must be a non-negative number")));
    }
    Ok(value)
}

fn parse_selected(raw: &str, row: usize) -> Result<bool, ImportError> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" | "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" => Ok(false),
        other => Err(invalid(row, "selected", format!("'{other}' is not a boolean"))),
    }
}

/// Reads the product catalogue, interning skill columns into `skills`.
pub fn read_products<R: Read>(
    reader: R,
    skills: &mut SkillCatalog,
    config: &PlannerConfig,
) -> Result<ProductCatalog, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::new(&headers, &PRODUCT_FIELDS, skills);
    let product_col = columns.required("product")?;
    let code_col = columns.required("output_code")?;
    let duration_col = columns.required("duration_seconds")?;
    let sequence_col = columns.optional("sequence");
    let task_col = columns.optional("task");
    let requires_col = columns.optional("requires");

    // Products in order of first appearance
    let mut products: Vec<Product> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_idx + 2;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let product = get_string_field(&record, Some(product_col))
            .ok_or_else(|| invalid(row, "product", "product name is empty"))?;
        let code = get_string_field(&record, Some(code_col))
            .ok_or_else(|| invalid(row, "output_code", "output code is empty"))?;
        let name = get_string_field(&record, task_col).unwrap_or_else(|| code.clone());

        let raw_seconds = get_string_field(&record, Some(duration_col)).unwrap_or_default();
        let seconds: f64 = raw_seconds
            .parse()
            .map_err(|_| invalid(row, "duration_seconds", format!("'{raw_seconds}' is not a number")))?;
        if !seconds.is_finite() || seconds < 0.0 {
            return Err(invalid(row, "duration_seconds", "duration must be non-negative"));
        }
        let duration = config.slots_for_seconds(seconds.ceil() as u64);

        let slot = *positions.entry(product.clone()).or_insert_with(|| {
            products.push(Product::new(product.clone()));
            products.len() - 1
        });
        let sequence = match get_string_field(&record, sequence_col) {
            Some(s) => s
                .parse::<u32>()
                .map_err(|_| invalid(row, "sequence", format!("'{s}' is not a whole number")))?,
            None => products[slot].tasks.len() as u32,
        };

        let mut task = TaskDefinition::new(code, name)
            .with_sequence(sequence)
            .with_duration(duration);
        if let Some(list) = get_string_field(&record, requires_col) {
            for req in list.split(',').map(str::trim).filter(|s| !s.is_empty()) {
                task = task.with_requirement(req);
            }
        }
        for &(col, skill) in &columns.skills {
            let header = headers.get(col).unwrap_or_default();
            let raw = record.get(col).unwrap_or_default();
            let weight = SkillScale::Percent.normalize(parse_skill(raw, row, header)?);
            if weight > 0.0 {
                task = task.with_skill(skill, weight);
            }
        }

        products[slot].tasks.push(task);
    }

    if products.is_empty() {
        return Err(ImportError::Empty);
    }
    debug!(products = products.len(), skills = skills.len(), "product catalogue imported");

    let mut catalogue = ProductCatalog::new();
    for product in products {
        catalogue.push(product);
    }
    Ok(catalogue)
}

/// Reads the worker roster, interning skill columns into `skills`.
pub fn read_workers<R: Read>(
    reader: R,
    skills: &mut SkillCatalog,
    scale: SkillScale,
) -> Result<Vec<Worker>, ImportError> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::Headers)
        .flexible(true)
        .from_reader(reader);

    let headers = reader.headers()?.clone();
    let columns = Columns::new(&headers, &WORKER_FIELDS, skills);
    let id_col = columns.required("id")?;
    let name_col = columns.optional("name");
    let preference_col = columns.optional("preference");
    let start_col = columns.optional("start_time");
    let favorites_col = columns.optional("favorites");
    let selected_col = columns.optional("selected");

    let mut workers = Vec::new();
    for (row_idx, result) in reader.records().enumerate() {
        let record = result?;
        let row = row_idx + 2;
        if record.iter().all(|c| c.trim().is_empty()) {
            continue;
        }

        let id = get_string_field(&record, Some(id_col))
            .ok_or_else(|| invalid(row, "id", "worker id is empty"))?;
        let mut worker = Worker::new(id);

        if let Some(name) = get_string_field(&record, name_col) {
            worker = worker.with_name(name);
        }
        if let Some(pref) = get_string_field(&record, preference_col) {
            worker = match pref.to_ascii_lowercase().as_str() {
                "fixed" => worker.with_preference(RolePreference::Fixed),
                "flow" => worker.with_preference(RolePreference::Flow),
                other => {
                    let affinity: f64 = other.parse().map_err(|_| {
                        invalid(row, "preference", format!("'{pref}' is not fixed, flow or a number"))
                    })?;
                    let affinity = affinity.clamp(0.0, 1.0);
                    let preference = if affinity >= FLOW_AFFINITY_CUTOFF {
                        RolePreference::Flow
                    } else {
                        RolePreference::Fixed
                    };
                    worker.with_preference(preference).with_flow_affinity(affinity)
                }
            };
        }
        if let Some(start) = get_string_field(&record, start_col) {
            worker = worker.with_start_time(start);
        }
        if let Some(list) = get_string_field(&record, favorites_col) {
            for fav in list.split(';').map(str::trim).filter(|s| !s.is_empty()) {
                worker = worker.with_favorite(fav);
            }
        }
        if let Some(col) = selected_col {
            if !parse_selected(record.get(col).unwrap_or_default(), row)? {
                worker = worker.deselected();
            }
        }
        for &(col, skill) in &columns.skills {
            let header = headers.get(col).unwrap_or_default();
            let raw = record.get(col).unwrap_or_default();
            let level = scale.normalize(parse_skill(raw, row, header)?);
            if level > 0.0 {
                worker = worker.with_skill(skill, level);
            }
        }

        workers.push(worker);
    }

    if workers.is_empty() {
        return Err(ImportError::Empty);
    }
    debug!(workers = workers.len(), "worker roster imported");
    Ok(workers)
}

/// Loads master data from a product CSV and a roster CSV on disk.
pub fn load_master_data(
    products: impl AsRef<Path>,
    workers: impl AsRef<Path>,
    config: &PlannerConfig,
    scale: SkillScale,
) -> Result<MasterData, ImportError> {
    let mut skills = SkillCatalog::new();
    let catalogue = read_products(std::fs::File::open(products)?, &mut skills, config)?;
    let roster = read_workers(std::fs::File::open(workers)?, &mut skills, scale)?;
    Ok(MasterData::new()
        .with_skills(skills)
        .with_products(catalogue)
        .with_workers(roster))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCTS: &str = "\
product,sequence,task,output_code,requires,duration_seconds,Cutting,Sewing
Boot,1,Cut upper,CUT,,1800,80%,
Boot,2,Sew upper,SEW,CUT,2400,,60
Boot,3,Last,LAST,\"CUT,SEW\",600,10,10
Belt,,Cut strap,STRAP,,3600,50,
";

    const WORKERS: &str = "\
id,name,preference,start_time,favorites,selected,Sewing,Cutting
W1,Ana,fixed,,Boot;Belt,,90,40
W2,Ben,0.7,09:30,,no,0.5,
W3,,flow,,,1,,
";

    #[test]
    fn test_read_products() {
        let mut skills = SkillCatalog::new();
        let config = PlannerConfig::default();
        let catalogue = read_products(PRODUCTS.as_bytes(), &mut skills, &config).unwrap();

        assert_eq!(catalogue.len(), 2);
        let boot = catalogue.get("Boot").unwrap();
        assert_eq!(boot.tasks.len(), 3);
        let cut = boot.task("CUT").unwrap();
        assert_eq!(cut.name, "Cut upper");
        assert_eq!(cut.duration_slots, 1);
        let cutting = skills.id("Cutting").unwrap();
        assert!((cut.requirements.get(cutting) - 80.0).abs() < 1e-10);

        let sew = boot.task("SEW").unwrap();
        assert_eq!(sew.duration_slots, 2);
        assert_eq!(sew.requires, vec!["CUT".to_string()]);
        assert_eq!(boot.task("LAST").unwrap().requires.len(), 2);

        // Empty sequence falls back to row order within the product
        let belt = catalogue.get("Belt").unwrap();
        assert_eq!(belt.tasks[0].sequence, 0);
        assert_eq!(belt.tasks[0].duration_slots, 2);
    }

    #[test]
    fn test_read_workers_share_skill_catalog() {
        let mut skills = SkillCatalog::new();
        let config = PlannerConfig::default();
        read_products(PRODUCTS.as_bytes(), &mut skills, &config).unwrap();
        let workers = read_workers(WORKERS.as_bytes(), &mut skills, SkillScale::Percent).unwrap();

        assert_eq!(skills.len(), 2);
        assert_eq!(workers.len(), 3);
        let w1 = &workers[0];
        assert_eq!(w1.name, "Ana");
        assert_eq!(w1.preference, RolePreference::Fixed);
        assert_eq!(w1.favorite_products, vec!["Boot".to_string(), "Belt".to_string()]);
        assert!(w1.selected);
        assert!((w1.skills.get(skills.id("Sewing").unwrap()) - 90.0).abs() < 1e-10);
        assert!((w1.skills.get(skills.id("Cutting").unwrap()) - 40.0).abs() < 1e-10);

        let w2 = &workers[1];
        assert_eq!(w2.preference, RolePreference::Flow);
        assert_eq!(w2.flow_affinity, Some(0.7));
        assert_eq!(w2.start_time.as_deref(), Some("09:30"));
        assert!(!w2.selected);

        let w3 = &workers[2];
        assert_eq!(w3.name, "W3");
        assert_eq!(w3.preference, RolePreference::Flow);
    }

    #[test]
    fn test_fraction_scale() {
        let mut skills = SkillCatalog::new();
        let csv = "id,Sewing\nW1,0.85\n";
        let workers = read_workers(csv.as_bytes(), &mut skills, SkillScale::Fraction).unwrap();
        assert!((workers[0].skills.get(SkillId(0)) - 85.0).abs() < 1e-10);
    }

    #[test]
    fn test_missing_column() {
        let mut skills = SkillCatalog::new();
        let csv = "product,task,duration_seconds\nBoot,Cut,60\n";
        let err = read_products(csv.as_bytes(), &mut skills, &PlannerConfig::default()).unwrap_err();
        assert!(matches!(err, ImportError::MissingColumn("output_code")));
    }

    #[test]
    fn test_invalid_value_reports_row() {
        let mut skills = SkillCatalog::new();
        let csv = "id,Sewing\nW1,50\nW2,lots\n";
        let err = read_workers(csv.as_bytes(), &mut skills, SkillScale::Percent).unwrap_err();
        match err {
            ImportError::InvalidValue { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "Sewing");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_bad_selected_flag() {
        let mut skills = SkillCatalog::new();
        let csv = "id,selected\nW1,maybe\n";
        let err = read_workers(csv.as_bytes(), &mut skills, SkillScale::Percent).unwrap_err();
        assert!(err.to_string().contains("selected"));
    }

    #[test]
    fn test_empty_file() {
        let mut skills = SkillCatalog::new();
        let err = read_workers("id,name\n".as_bytes(), &mut skills, SkillScale::Percent).unwrap_err();
        assert!(matches!(err, ImportError::Empty));
    }

    #[test]
    fn test_imported_data_plans() {
        let mut skills = SkillCatalog::new();
        let config = PlannerConfig::default();
        let products = read_products(PRODUCTS.as_bytes(), &mut skills, &config).unwrap();
        let workers = read_workers(WORKERS.as_bytes(), &mut skills, SkillScale::Percent).unwrap();
        let data = MasterData::new()
            .with_skills(skills)
            .with_products(products)
            .with_workers(workers);
        assert!(data.validate().is_ok());
    }
}
