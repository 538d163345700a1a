/*
 * This Source Code Form is subject to the terms of the Mozilla Public License,
 * v. 2.0. If a copy of the MPL was not distributed with this file, You can
 * obtain one at http://mozilla.org/MPL/2.0/.
 *
 *
 * Copyright 2018-2022 Clemens Lutz
 * Author: Clemens Lutz <lutzcle@cml.li>
 */

use crate::error::{ErrorKind, Result};
use procfs::CpuInfo;

/// Returns the codename of the current CPU.
///
/// For example: `Intel(R) Core(TM) i7-5600U CPU @ 2.60GHz`
#[cfg(not(target_arch = "powerpc64"))]
pub fn cpu_codename() -> Result<String> {
    let cpu_id = 0;
    let codename = CpuInfo::new()?
        .model_name(cpu_id)
        .ok_or_else(|| ErrorKind::RuntimeError("Failed to get CPU codename".to_string()))?
        .to_string();

    Ok(codename)
}

/// Returns the codename of the current CPU.
///
/// For example: `POWER9, altivec supported`
#[cfg(target_arch = "powerpc64")]
pub fn cpu_codename() -> Result<String> {
    let cpu_id = 0;
    let codename = CpuInfo::new()?
        .get_info(cpu_id)
        .and_then(|mut m| m.remove("cpu"))
        .ok_or_else(|| ErrorKind::RuntimeError("Failed to get CPU codename".to_string()))?
        .to_string();

    Ok(codename)
}

/// Returns the host name of the machine.
pub fn hostname() -> Result<String> {
    let name = ::hostname::get()?.into_string().map_err(|_| {
        ErrorKind::RuntimeError("Couldn't convert hostname into UTF-8 string".to_string())
    })?;

    Ok(name)
}
