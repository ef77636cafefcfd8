use crate::models::{ControlPlane, MlagFindings, MlagRuntimeState, PortChannelClass, MLAG_ACTIVE};

/// Classify a `show mlag` snapshot into report findings
pub fn classify(state: &MlagRuntimeState) -> MlagFindings {
    if !state.is_configured() {
        return MlagFindings::NotConfigured;
    }

    if state.state != MLAG_ACTIVE {
        return MlagFindings::Assessed {
            control_plane: ControlPlane::NotActive(state.state.clone()),
            port_channels: Vec::new(),
        };
    }

    let port_channels = PortChannelClass::ALL
        .iter()
        .map(|class| (*class, class.count(&state.mlag_ports)))
        .filter(|(_, count)| *count != 0)
        .collect();

    MlagFindings::Assessed {
        control_plane: ControlPlane::Active,
        port_channels,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MlagPortCounts;

    fn configured(state: &str, ports: MlagPortCounts) -> MlagRuntimeState {
        MlagRuntimeState {
            domain_id: Some("pod1".to_string()),
            peer_link: Some("Port-Channel10".to_string()),
            local_interface: Some("Vlan4094".to_string()),
            state: state.to_string(),
            mlag_ports: ports,
        }
    }

    #[test]
    fn test_missing_peer_link_is_not_configured() {
        let mut state = configured(MLAG_ACTIVE, MlagPortCounts::default());
        state.peer_link = None;
        assert_eq!(classify(&state), MlagFindings::NotConfigured);
    }

    #[test]
    fn test_null_domain_id_is_still_assessed() {
        let raw = serde_json::json!({
            "domainId": null,
            "peerLink": "Port-Channel10",
            "localInterface": "Vlan4094",
            "state": "active",
            "mlagPorts": { "Active-full": 2 }
        });
        let state: MlagRuntimeState = serde_json::from_value(raw).unwrap();
        assert_eq!(
            classify(&state),
            MlagFindings::Assessed {
                control_plane: ControlPlane::Active,
                port_channels: vec![(PortChannelClass::ActiveFull, 2)],
            }
        );
    }

    #[test]
    fn test_active_with_zero_ports() {
        let findings = classify(&configured(MLAG_ACTIVE, MlagPortCounts::default()));
        assert_eq!(
            findings,
            MlagFindings::Assessed {
                control_plane: ControlPlane::Active,
                port_channels: vec![],
            }
        );
        assert_eq!(findings.lines().len(), 1);
    }

    #[test]
    fn test_active_reports_nonzero_classes_in_order() {
        let ports = MlagPortCounts {
            active_full: 6,
            inactive: 0,
            active_partial: 1,
        };
        let findings = classify(&configured(MLAG_ACTIVE, ports));
        let lines = findings.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].1, "MLAG Control Plane is active");
        assert_eq!(lines[1], ("MLAG Active-full Port Channels".to_string(), "6".to_string()));
        assert_eq!(lines[2], ("MLAG Active-partial Port Channels".to_string(), "1".to_string()));
    }

    #[test]
    fn test_inactive_control_plane_skips_ports() {
        let ports = MlagPortCounts {
            active_full: 2,
            inactive: 3,
            active_partial: 0,
        };
        let findings = classify(&configured("standby", ports));
        let lines = findings.lines();
        assert_eq!(lines.len(), 1);
        assert_eq!(
            lines[0].1,
            "MLAG Control Plane is not Active. Its current state is standby"
        );
    }
}
