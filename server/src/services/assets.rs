use tracing::info;
use ubsmap_shared::AssetNotFoundError;

use crate::config::Settings;

/// Every static image the dashboard links to must exist before serving.
pub fn verify_assets(settings: &Settings) -> Result<(), AssetNotFoundError> {
    for path in settings.logo_paths() {
        if !path.is_file() {
            return Err(AssetNotFoundError { path });
        }
    }
    info!(assets_dir = %settings.assets_dir.display(), "static assets present");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::TempAssets;

    #[test]
    fn complete_assets_dir_passes() {
        let assets = TempAssets::with_fixtures();
        assert_eq!(verify_assets(&assets.settings()), Ok(()));
    }

    #[test]
    fn missing_logo_is_reported_by_path() {
        let assets = TempAssets::with_fixtures();
        let missing = assets.dir().join("logo_pet.png");
        std::fs::remove_file(&missing).expect("remove logo");

        assert_eq!(
            verify_assets(&assets.settings()),
            Err(AssetNotFoundError { path: missing })
        );
    }
}
