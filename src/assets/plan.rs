//! Copy planning.
//!
//! # Responsibilities
//! - Select the declarations that apply to a build variant
//! - Resolve sources against the dependency root, destinations against the public root
//! - Anchor relative roots at the current directory so every task path is absolute
//! - Enforce unique destinations within a variant

use std::collections::HashMap;
use std::path::{Component, Path, PathBuf};

use crate::config::AssetsConfig;
use super::{AppliesTo, AssetCopyTask, AssetError, BuildVariant};

/// The ordered copy tasks for one build invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyPlan {
    pub variant: BuildVariant,
    pub tasks: Vec<AssetCopyTask>,
}

impl CopyPlan {
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

/// Plan the copies declared in `config` for `variant`.
pub fn plan_copies(config: &AssetsConfig, variant: BuildVariant) -> Result<CopyPlan, AssetError> {
    let dependency_root = absolute_root(&config.dependency_root)?;
    let public_root = absolute_root(&config.public_root)?;

    let mut tasks = Vec::new();
    let mut seen: HashMap<PathBuf, usize> = HashMap::new();

    for (index, decl) in config.copies.iter().enumerate() {
        if !decl.variant.includes(variant) {
            continue;
        }

        let relative = normalize(&decl.destination).ok_or_else(|| AssetError::OutsideRoot {
            index,
            destination: decl.destination.clone(),
        })?;

        if let Some(&first) = seen.get(&relative) {
            return Err(AssetError::DestinationCollision {
                variant,
                destination: public_root.join(&relative),
                first,
                second: index,
            });
        }
        seen.insert(relative.clone(), index);

        tasks.push(AssetCopyTask {
            index,
            source: dependency_root.join(&decl.source),
            destination: public_root.join(relative),
            applies_to: decl.variant,
        });
    }

    Ok(CopyPlan { variant, tasks })
}

fn absolute_root(root: &Path) -> Result<PathBuf, AssetError> {
    std::path::absolute(root).map_err(|source| AssetError::Io {
        path: root.to_path_buf(),
        source,
    })
}

/// Lexically normalize a relative path. `None` if it is absolute, empty, or climbs out.
fn normalize(path: &Path) -> Option<PathBuf> {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::Normal(part) => out.push(part),
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    return None;
                }
            }
            Component::RootDir | Component::Prefix(_) => return None,
        }
    }
    if out.as_os_str().is_empty() {
        None
    } else {
        Some(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CopyDeclaration;

    fn config(copies: Vec<CopyDeclaration>) -> AssetsConfig {
        AssetsConfig {
            dependency_root: PathBuf::from("/app/node_modules"),
            public_root: PathBuf::from("/app/public"),
            copies,
        }
    }

    #[test]
    fn test_reference_plan_is_client_only() {
        let assets = AssetsConfig::default();

        let client = plan_copies(&assets, BuildVariant::Client).unwrap();
        let cwd = std::env::current_dir().unwrap();
        assert_eq!(client.tasks.len(), 3);
        assert_eq!(
            client.tasks[0].destination,
            cwd.join("public/hls.js/hls.min.js")
        );
        assert_eq!(
            client.tasks[0].source,
            cwd.join("node_modules/hls.js/dist/hls.min.js")
        );
        for task in &client.tasks {
            assert!(task.source.is_absolute() && task.destination.is_absolute());
            assert_eq!(task.applies_to, AppliesTo::Client);
        }

        let server = plan_copies(&assets, BuildVariant::Server).unwrap();
        assert!(server.is_empty());
    }

    #[test]
    fn test_variant_filtering() {
        let assets = config(vec![
            CopyDeclaration::new("a.js", "a.js", AppliesTo::Server),
            CopyDeclaration::new("b.js", "b.js", AppliesTo::Client),
            CopyDeclaration::new("c.js", "c.js", AppliesTo::Both),
        ]);

        let server: Vec<_> = plan_copies(&assets, BuildVariant::Server)
            .unwrap()
            .tasks
            .into_iter()
            .map(|t| t.index)
            .collect();
        assert_eq!(server, vec![0, 2]);

        let client = plan_copies(&assets, BuildVariant::Client).unwrap();
        assert_eq!(client.tasks[0].source, Path::new("/app/node_modules/b.js"));
        assert_eq!(client.tasks[1].destination, Path::new("/app/public/c.js"));
    }

    #[test]
    fn test_collision_within_variant() {
        let assets = config(vec![
            CopyDeclaration::new("one/x.json", "data/x.json", AppliesTo::Client),
            CopyDeclaration::new("two/x.json", "./data/x.json", AppliesTo::Both),
        ]);
        match plan_copies(&assets, BuildVariant::Client) {
            Err(AssetError::DestinationCollision { first, second, destination, .. }) => {
                assert_eq!((first, second), (0, 1));
                assert_eq!(destination, Path::new("/app/public/data/x.json"));
            }
            other => panic!("expected collision, got {:?}", other),
        }
        // Server builds only see the second declaration.
        assert_eq!(plan_copies(&assets, BuildVariant::Server).unwrap().tasks.len(), 1);
    }

    #[test]
    fn test_same_destination_in_different_variants_is_allowed() {
        let assets = config(vec![
            CopyDeclaration::new("server/cfg.json", "cfg.json", AppliesTo::Server),
            CopyDeclaration::new("client/cfg.json", "cfg.json", AppliesTo::Client),
        ]);
        assert!(plan_copies(&assets, BuildVariant::Server).is_ok());
        assert!(plan_copies(&assets, BuildVariant::Client).is_ok());
    }

    #[test]
    fn test_destination_must_stay_under_public_root() {
        let assets = config(vec![CopyDeclaration::new("x", "../x", AppliesTo::Client)]);
        assert!(matches!(
            plan_copies(&assets, BuildVariant::Client),
            Err(AssetError::OutsideRoot { .. })
        ));

        let assets = config(vec![CopyDeclaration::new("x", "/etc/x", AppliesTo::Client)]);
        assert!(plan_copies(&assets, BuildVariant::Client).is_err());
    }
}
