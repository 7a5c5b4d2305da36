//! Schedule export.
//!
//! Writes a plan as one CSV row per (day, slot, worker). Idle cells are
//! kept so that every worker's day reads as a complete timeline.

use std::io::Write;

use serde::Serialize;

use crate::config::PlannerConfig;
use crate::error::ImportError;
use crate::models::InstanceStatus;
use crate::planning::PlanResult;
use crate::store::MasterData;

/// Status text of an idle cell.
pub const IDLE: &str = "IDLE";

const HEADER: [&str; 10] = [
    "day",
    "time",
    "worker",
    "worker_name",
    "role",
    "product",
    "unit",
    "task_code",
    "task_name",
    "status",
];

#[derive(Debug, Serialize)]
struct ScheduleRow<'a> {
    day: u32,
    time: String,
    worker: &'a str,
    worker_name: &'a str,
    role: Option<String>,
    product: Option<&'a str>,
    unit: Option<u32>,
    task_code: Option<&'a str>,
    task_name: Option<&'a str>,
    status: String,
}

/// Writes the schedule grid of `result` as CSV.
///
/// Days are 1-based and times are slot start times (`HH:MM`). Worker names
/// come from `data`; a worker missing from it is written with its id.
pub fn write_schedule<W: Write>(
    writer: W,
    result: &PlanResult,
    data: &MasterData,
    config: &PlannerConfig,
) -> Result<(), ImportError> {
    let mut out = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    out.write_record(HEADER)?;
    let schedule = &result.schedule;
    let spd = schedule.slots_per_day();

    for day in 0..schedule.days() {
        for slot in 0..spd {
            let index = day * spd + slot;
            let time = config.time_from_slot(slot);
            for (w, id) in schedule.workers().iter().enumerate() {
                let worker_name = data.worker(id).map_or(id.as_str(), |wk| wk.name.as_str());
                let cell = schedule
                    .at(w, index)
                    .and_then(|o| result.instance(o.instance).map(|inst| (o.role, inst)));

                let row = match cell {
                    Some((role, inst)) => ScheduleRow {
                        day: day + 1,
                        time: time.clone(),
                        worker: id,
                        worker_name,
                        role: Some(role.to_string()),
                        product: Some(inst.product.as_str()),
                        unit: Some(inst.unit),
                        task_code: Some(inst.code.as_str()),
                        task_name: Some(inst.name.as_str()),
                        status: status_text(inst.status).to_string(),
                    },
                    None => ScheduleRow {
                        day: day + 1,
                        time: time.clone(),
                        worker: id,
                        worker_name,
                        role: None,
                        product: None,
                        unit: None,
                        task_code: None,
                        task_name: None,
                        status: IDLE.to_string(),
                    },
                };
                out.serialize(row)?;
            }
        }
    }

    out.flush()?;
    Ok(())
}

fn status_text(status: InstanceStatus) -> &'static str {
    match status {
        InstanceStatus::Pending => "PENDING",
        InstanceStatus::InProgress => "IN_PROGRESS",
        InstanceStatus::Completed => "COMPLETED",
    }
}

/// Renders the schedule CSV into a string.
pub fn schedule_to_string(
    result: &PlanResult,
    data: &MasterData,
    config: &PlannerConfig,
) -> Result<String, ImportError> {
    let mut buf = Vec::new();
    write_schedule(&mut buf, result, data, config)?;
    String::from_utf8(buf).map_err(|e| ImportError::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Order, Product, TaskDefinition, Worker};
    use crate::planning::{plan, PlanRequest};

    fn data() -> MasterData {
        MasterData::new()
            .with_product(
                Product::new("Boot")
                    .with_task(TaskDefinition::new("CUT", "Cut"))
                    .with_task(TaskDefinition::new("SEW", "Sew").with_requirement("CUT")),
            )
            .with_worker(Worker::new("W1").with_name("Ana"))
    }

    #[test]
    fn test_one_row_per_cell() {
        let data = data();
        let config = PlannerConfig::default();
        let result = plan(&data, &PlanRequest::new(Order::new().with("Boot", 1)), &config).unwrap();
        let text = schedule_to_string(&result, &data, &config).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(
            lines[0],
            "day,time,worker,worker_name,role,product,unit,task_code,task_name,status"
        );
        // One day of 16 slots for one worker
        assert_eq!(lines.len(), 1 + 16);
        assert_eq!(lines[1], "1,08:00,W1,Ana,flow,Boot,1,CUT,Cut,COMPLETED");
        assert_eq!(lines[2], "1,08:30,W1,Ana,flow,Boot,1,SEW,Sew,COMPLETED");
        assert_eq!(lines[3], "1,09:00,W1,Ana,,,,,,IDLE");
    }

    #[test]
    fn test_empty_schedule_has_header_only() {
        let data = data();
        let config = PlannerConfig::default();
        let mut result = plan(&data, &PlanRequest::new(Order::new().with("Boot", 1)), &config).unwrap();
        result.schedule.truncate_days(0);
        let text = schedule_to_string(&result, &data, &config).unwrap();
        assert_eq!(text.lines().count(), 1);
    }
}
