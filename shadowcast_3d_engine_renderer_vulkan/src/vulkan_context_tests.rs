use super::*;

#[test]
fn test_exhausted_heap_maps_to_out_of_memory() {
    let error = allocation_error("shadow cube", 64 * 1024 * 1024, AllocationError::OutOfMemory);
    assert!(matches!(error, Error::OutOfMemory));
}

#[test]
fn test_other_allocator_failures_stay_backend_errors() {
    let error = allocation_error(
        "vertices",
        1024,
        AllocationError::InvalidAllocationCreateDesc,
    );
    match error {
        Error::BackendError(message) => {
            assert!(message.contains("vertices"), "{message}");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}
