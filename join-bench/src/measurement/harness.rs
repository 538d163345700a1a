/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright (c) 2019-2022, Clemens Lutz <lutzcle@cml.li>
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

use super::data_point::DataPoint;
use crate::error::Result;
use std::path::Path;

/// Timings of one iteration.
#[derive(Debug, Default)]
pub struct JoinPoint {
    pub join_ns: Option<f64>,
    pub gather_ns: Option<f64>,
    pub total_ns: Option<f64>,
    pub result_tuples: Option<usize>,
}

/// Runs `func` once to warm up, and then `repeat` times.
///
/// Returns one data point per run. Only the warm-up data point carries the
/// initialization times of the template.
pub fn measure<F>(name: &str, repeat: u32, template: DataPoint, mut func: F) -> Result<Vec<DataPoint>>
where
    F: FnMut() -> Result<JoinPoint>,
{
    let _span = tracing::info_span!("measure", name).entered();

    (0..=repeat)
        .zip(std::iter::once(true).chain(std::iter::repeat(false)))
        .map(|(_, warm_up)| {
            func().map(|p| DataPoint {
                warm_up: Some(warm_up),
                relation_malloc_ns: if warm_up {
                    template.relation_malloc_ns
                } else {
                    None
                },
                relation_gen_ns: if warm_up {
                    template.relation_gen_ns
                } else {
                    None
                },
                join_ns: p.join_ns,
                gather_ns: p.gather_ns,
                total_ns: p.total_ns,
                result_tuples: p.result_tuples,
                ..template.clone()
            })
        })
        .collect()
}

pub fn write_csv<P: AsRef<Path>>(out_file_name: P, measurements: &[DataPoint]) -> Result<()> {
    let csv_file = std::fs::File::create(out_file_name)?;
    let mut csv = csv::Writer::from_writer(csv_file);
    measurements.iter().try_for_each(|row| csv.serialize(row))?;
    csv.flush()?;

    Ok(())
}
