#![no_main]

use dependi_versions::requirement::{DockerRequirement, GradleRequirement};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(content) = std::str::from_utf8(data) {
        let (requirement, version) = content.split_once('\n').unwrap_or((content, "1.0"));

        // Parse failures are expected; panics are not
        if let Ok(alternatives) = GradleRequirement::requirements_array(requirement) {
            for req in &alternatives {
                let _ = req.satisfied_by_str(version);
                let _ = req.to_string();
            }
        }
        if let Ok(req) = DockerRequirement::parse(requirement) {
            let _ = req.satisfied_by_str(version);
        }
    }
});
