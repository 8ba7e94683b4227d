use clap::{Parser, Subcommand};
use tessera_core::{AppError, AppResult, ResourceId};
use tessera_domain::ResourcePermission;

/// Suffix requesting the grant option on a permission argument.
const GRANT_OPTION_SUFFIX: &str = "/G";

/// Inspect and maintain a tessera authorization database.
#[derive(Debug, Parser)]
#[command(name = "tessera-cli", version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: CliCommand,
}

#[derive(Debug, PartialEq, Eq, Subcommand)]
pub enum CliCommand {
    /// Apply pending database migrations
    Migrate,
    /// Print the effective permissions of one resource on another
    ResourcePermissions {
        #[arg(value_parser = parse_resource_id)]
        accessor_id: ResourceId,
        #[arg(value_parser = parse_resource_id)]
        accessed_id: ResourceId,
    },
    /// Check that every listed permission is held; a trailing /G requires the grant option
    CheckResource {
        #[arg(value_parser = parse_resource_id)]
        accessor_id: ResourceId,
        #[arg(value_parser = parse_resource_id)]
        accessed_id: ResourceId,
        #[arg(required = true, value_parser = parse_permission)]
        requested: Vec<ResourcePermission>,
    },
    /// Print resource-create permissions, for every domain and class unless a class is given
    CreatePermissions {
        #[arg(value_parser = parse_resource_id)]
        accessor_id: ResourceId,
        /// Resource class name
        #[arg(long = "class")]
        resource_class: Option<String>,
        /// Domain name, defaults to the accessor's domain
        #[arg(long, requires = "resource_class")]
        domain: Option<String>,
    },
    /// List a domain and its descendants by level
    Descendants { domain_name: String },
}

fn parse_resource_id(value: &str) -> AppResult<ResourceId> {
    value
        .trim()
        .parse::<i64>()
        .map(ResourceId::new)
        .map_err(|error| AppError::Validation(format!("invalid resource id '{value}': {error}")))
}

fn parse_permission(argument: &str) -> AppResult<ResourcePermission> {
    match argument.strip_suffix(GRANT_OPTION_SUFFIX) {
        Some(name) => ResourcePermission::instance_with_grant_option(name.trim_end()),
        None => ResourcePermission::instance(argument),
    }
}

#[cfg(test)]
mod tests {
    use clap::error::ErrorKind;
    use proptest::prelude::*;

    use super::*;

    fn parse(args: &[&str]) -> Result<CliCommand, clap::Error> {
        Cli::try_parse_from(std::iter::once("tessera-cli").chain(args.iter().copied()))
            .map(|cli| cli.command)
    }

    #[test]
    fn check_resource_reads_grant_option_suffix() {
        let command = parse(&["check-resource", "7", "9", "read", "edit/G"]);

        let Ok(CliCommand::CheckResource { requested, .. }) = command else {
            panic!("expected check-resource command");
        };
        let rendered: Vec<String> = requested.iter().map(ToString::to_string).collect();
        assert_eq!(rendered, vec!["read".to_owned(), "edit /G".to_owned()]);
    }

    #[test]
    fn system_permissions_are_accepted_by_name() {
        let command = parse(&["check-resource", "1", "2", "*INHERIT"]);

        let Ok(CliCommand::CheckResource { requested, .. }) = command else {
            panic!("expected check-resource command");
        };
        assert!(requested[0].is_inherit());
    }

    #[test]
    fn malformed_invocations_are_rejected() {
        assert!(parse(&[]).is_err());
        for (invocation, kind) in [
            (&["check-resource", "1", "2"][..], ErrorKind::MissingRequiredArgument),
            (&["descendants"][..], ErrorKind::MissingRequiredArgument),
            (&["migrate", "now"][..], ErrorKind::UnknownArgument),
            (&["unknown"][..], ErrorKind::InvalidSubcommand),
            (&["resource-permissions", "one", "2"][..], ErrorKind::ValueValidation),
        ] {
            let result = parse(invocation);
            assert_eq!(result.err().map(|error| error.kind()), Some(kind), "{invocation:?}");
        }
    }

    #[test]
    fn unknown_system_permission_is_rejected() {
        let result = parse(&["check-resource", "1", "2", "*FLY"]);

        assert_eq!(
            result.err().map(|error| error.kind()),
            Some(ErrorKind::ValueValidation)
        );
    }

    #[test]
    fn create_permissions_domain_is_optional_but_needs_a_class() {
        let command = parse(&["create-permissions", "7", "--class", "Doc"]);
        assert_eq!(
            command.ok(),
            Some(CliCommand::CreatePermissions {
                accessor_id: ResourceId::new(7),
                resource_class: Some("Doc".to_owned()),
                domain: None,
            })
        );

        let orphan_domain = parse(&["create-permissions", "7", "--domain", "parent"]);
        assert_eq!(
            orphan_domain.err().map(|error| error.kind()),
            Some(ErrorKind::MissingRequiredArgument)
        );
    }

    proptest! {
        #[test]
        fn resource_ids_parse_as_given(accessor in any::<i64>(), accessed in any::<i64>()) {
            let accessor_arg = accessor.to_string();
            let accessed_arg = accessed.to_string();
            let command = parse(&[
                "resource-permissions",
                "--",
                accessor_arg.as_str(),
                accessed_arg.as_str(),
            ]);

            prop_assert_eq!(
                command.ok(),
                Some(CliCommand::ResourcePermissions {
                    accessor_id: ResourceId::new(accessor),
                    accessed_id: ResourceId::new(accessed),
                })
            );
        }
    }
}
