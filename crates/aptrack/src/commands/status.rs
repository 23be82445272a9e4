//! Status command handlers.

use tabled::Tabled;

use aptrack_core::{Device, DeviceMonitor, presence_view};

use crate::cli::{GlobalOpts, StatusArgs, StatusCommand};
use crate::config::{self, Config};
use crate::error::CliError;
use crate::output;

// ── Table row ───────────────────────────────────────────────────────

#[derive(Tabled)]
struct DeviceRow {
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "MAC")]
    mac: String,
    #[tabled(rename = "IP")]
    ip: String,
    #[tabled(rename = "Interface")]
    interface_type: String,
    #[tabled(rename = "Connected To")]
    connected_to: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Seen By")]
    seen_by: String,
}

fn or_dash(value: &str) -> String {
    if value.is_empty() {
        "-".into()
    } else {
        value.to_owned()
    }
}

fn device_row(d: &Device, color: bool) -> DeviceRow {
    DeviceRow {
        name: or_dash(&d.name),
        mac: d.mac.to_string(),
        ip: or_dash(&d.ip),
        interface_type: or_dash(&d.interface_type),
        connected_to: or_dash(&d.connected_to),
        status: output::presence_label(d.status, color),
        seen_by: d.seen_by.join(", "),
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(args: StatusArgs, cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        StatusCommand::Show { by_hostname } => {
            let monitor = DeviceMonitor::new(config::access_points(cfg)?);
            let mut state = config::open_state(global)?;
            let by_mac = monitor.poll(&mut state).await?;

            let devices: Vec<Device> = if by_hostname {
                presence_view(&by_mac).into_values().collect()
            } else {
                by_mac.into_values().collect()
            };

            let color = output::should_color(&global.color);
            let out = output::render_list(
                &global.output,
                &devices,
                |d| device_row(d, color),
                |d| {
                    if by_hostname {
                        d.name.clone()
                    } else {
                        d.mac.to_string()
                    }
                },
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aptrack_core::MacAddress;
    use pretty_assertions::assert_eq;

    #[test]
    fn row_fills_missing_fields_with_dashes() {
        let mut device = Device::new(MacAddress::new("AA:BB:CC:DD:EE:01"));
        device.seen_by = vec!["Fritz!Box".into(), "Repeater attic".into()];

        let row = device_row(&device, false);
        assert_eq!(row.name, "-");
        assert_eq!(row.mac, "aa:bb:cc:dd:ee:01");
        assert_eq!(row.ip, "-");
        assert_eq!(row.status, "not_home");
        assert_eq!(row.seen_by, "Fritz!Box, Repeater attic");
    }
}
