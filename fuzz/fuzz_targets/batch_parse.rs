#![no_main]

use libfuzzer_sys::fuzz_target;
use linepatch_types::batch::PatchBatch;
use linepatch_types::wire::BatchV1;

fuzz_target!(|data: &[u8]| {
    let Ok(wire) = serde_json::from_slice::<BatchV1>(data) else {
        return;
    };
    let Ok(batch) = PatchBatch::try_from(wire) else {
        return;
    };

    // Validated operations must never carry paths that escape the project root.
    for op in &batch.patches {
        assert!(op.file.is_relative());
        assert!(
            !op.file
                .components()
                .any(|c| matches!(c, camino::Utf8Component::ParentDir))
        );
    }
    let _ = serde_json::to_string(&BatchV1::from(&batch));
});
