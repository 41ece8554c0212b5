use std::collections::VecDeque;

use windows::{
    core::{Interface, PCSTR},
    Win32::{
        Foundation::{CloseHandle, E_FAIL, HANDLE, WAIT_EVENT, WAIT_FAILED, WAIT_OBJECT_0},
        Graphics::Direct3D12::*,
        System::Threading::{CreateEventA, WaitForSingleObject, INFINITE},
    },
};

use super::util::*;
use crate::sync::{FenceCounter, FenceValue, RetiredQueue};

pub struct Queue {
    command_list_type: D3D12_COMMAND_LIST_TYPE,
    queue: ID3D12CommandQueue,

    // an allocator cannot be reset until the GPU finishes the commands recorded into it
    allocators: RetiredQueue<ID3D12CommandAllocator>,
    allocator_count: usize,

    command_lists: VecDeque<ID3D12GraphicsCommandList>,
    command_list_count: usize,

    device: ID3D12Device2,

    fence: ID3D12Fence,
    fence_event: HANDLE,
    fence_counter: FenceCounter,

    name: String,
}

impl Queue {
    pub fn build(
        device: &ID3D12Device2,
        command_list_type: D3D12_COMMAND_LIST_TYPE,
        name: String,
    ) -> windows::core::Result<Self> {
        let desc = D3D12_COMMAND_QUEUE_DESC {
            Type: command_list_type,
            Priority: D3D12_COMMAND_QUEUE_PRIORITY_NORMAL.0,
            Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
            NodeMask: 0,
        };
        let queue: ID3D12CommandQueue = unsafe { device.CreateCommandQueue(&desc) }?;
        set_name_str(&queue, &name)?;

        let initial_value = 0;
        let fence: ID3D12Fence =
            unsafe { device.CreateFence(initial_value, D3D12_FENCE_FLAG_NONE) }?;
        set_name_str(&fence, &format!("{name}::fence"))?;

        let fence_event = unsafe { CreateEventA(None, false, false, PCSTR::null()) }?;

        tracing::debug!("Created {name}");

        Ok(Self {
            command_list_type,
            queue,
            allocators: RetiredQueue::new(),
            allocator_count: 0,
            command_lists: VecDeque::new(),
            command_list_count: 0,
            device: device.clone(),
            fence,
            fence_event,
            fence_counter: FenceCounter::new(initial_value),
            name,
        })
    }

    pub fn request_command_ctx(&mut self) -> windows::core::Result<Context> {
        let completed_value = self.completed_value();
        let allocator = match self.allocators.reclaim(completed_value) {
            Some(allocator) => {
                unsafe { allocator.Reset() }?;
                allocator
            }
            None => {
                let name = format!("{}::allocators[{}]", self.name, self.allocator_count);
                self.allocator_count += 1;
                create_allocator(&self.device, self.command_list_type, &name)?
            }
        };

        let command_list = match self.command_lists.pop_front() {
            Some(command_list) => {
                unsafe { command_list.Reset(&allocator, None) }?;
                command_list
            }
            None => {
                let name = format!("{}::command_lists[{}]", self.name, self.command_list_count);
                self.command_list_count += 1;
                create_command_list(
                    &self.device,
                    &allocator,
                    self.command_list_type,
                    None,
                    &name,
                )?
            }
        };

        Ok(Context {
            command_list,
            allocator,
        })
    }

    #[must_use]
    pub fn get(&self) -> &ID3D12CommandQueue {
        &self.queue
    }

    pub fn execute_commands(&mut self, context: Context) -> windows::core::Result<FenceValue> {
        let command_list = context.command_list;
        unsafe {
            command_list.Close()?;

            let command_lists = [Some(command_list.cast()?)];
            self.queue.ExecuteCommandLists(&command_lists);
        }
        self.command_lists.push_back(command_list);

        let fence_value = self.signal()?;
        self.allocators.retire(context.allocator, fence_value);

        Ok(fence_value)
    }

    pub fn signal(&mut self) -> windows::core::Result<FenceValue> {
        let fence_value = self.fence_counter.next();
        unsafe { self.queue.Signal(&self.fence, fence_value.value()) }?;
        Ok(fence_value)
    }

    pub fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    pub fn is_fence_completed(&self, fence_value: FenceValue) -> bool {
        fence_value.is_reached_by(self.completed_value())
    }

    pub fn wait_fence(&self, fence_value: FenceValue) -> windows::core::Result<()> {
        if self.is_fence_completed(fence_value) {
            return Ok(());
        }

        let event = unsafe {
            self.fence
                .SetEventOnCompletion(fence_value.value(), self.fence_event)?;
            WaitForSingleObject(self.fence_event, INFINITE)
        };
        check_wait(event)
    }

    pub fn flush(&mut self) -> windows::core::Result<()> {
        let v = self.signal()?;
        self.wait_fence(v)
    }
}

impl Drop for Queue {
    fn drop(&mut self) {
        if let Err(e) = self.flush() {
            tracing::error!("Failed to flush {}: {e}", self.name);
        }
        if let Err(e) = unsafe { CloseHandle(self.fence_event) } {
            tracing::error!("Failed to close the fence event of {}: {e}", self.name);
        }
    }
}

#[must_use]
pub struct Context {
    command_list: ID3D12GraphicsCommandList,
    allocator: ID3D12CommandAllocator,
}

impl Context {
    pub fn command_list(&self) -> &ID3D12GraphicsCommandList {
        &self.command_list
    }
}

/// Only a signaled event means the fence was reached.
fn check_wait(event: WAIT_EVENT) -> windows::core::Result<()> {
    match event {
        WAIT_OBJECT_0 => Ok(()),
        WAIT_FAILED => Err(windows::core::Error::from_win32()),
        other => Err(windows::core::Error::new(
            E_FAIL,
            format!("Fence wait ended with {:#x}", other.0),
        )),
    }
}

fn create_allocator(
    device: &ID3D12Device2,
    cmd_list_type: D3D12_COMMAND_LIST_TYPE,
    name: &str,
) -> windows::core::Result<ID3D12CommandAllocator> {
    let allocator: ID3D12CommandAllocator =
        unsafe { device.CreateCommandAllocator(cmd_list_type) }?;
    set_name_str(&allocator, name)?;
    Ok(allocator)
}

fn create_command_list(
    device: &ID3D12Device2,
    allocator: &ID3D12CommandAllocator,
    command_list_type: D3D12_COMMAND_LIST_TYPE,
    initial_state: Option<&ID3D12PipelineState>,
    name: &str,
) -> windows::core::Result<ID3D12GraphicsCommandList> {
    let command_list: ID3D12GraphicsCommandList =
        unsafe { device.CreateCommandList(0, command_list_type, allocator, initial_state) }?;
    set_name_str(&command_list, name)?;

    Ok(command_list)
}

#[cfg(test)]
mod tests {
    use windows::Win32::Foundation::{WAIT_ABANDONED, WAIT_TIMEOUT};

    use super::*;

    #[test]
    fn only_a_signaled_event_completes_the_wait() {
        assert!(check_wait(WAIT_OBJECT_0).is_ok());
        assert!(check_wait(WAIT_FAILED).is_err());
        assert!(check_wait(WAIT_TIMEOUT).is_err());
        assert!(check_wait(WAIT_ABANDONED).is_err());
    }
}
