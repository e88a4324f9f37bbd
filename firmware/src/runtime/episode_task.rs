use crate::diagnostics::SerialDiagnostics;
use crate::hw::BackupRegisterStore;

use super::BoardController;

#[embassy_executor::task]
pub async fn run(
    mut controller: BoardController,
    mut store: BackupRegisterStore,
    mut diagnostics: SerialDiagnostics,
) -> ! {
    controller.run_forever(&mut store, &mut diagnostics);
}
